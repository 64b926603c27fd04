//! End-to-end demo: job submission through the in-memory stack, plus the
//! tiered content cache.
//!
//! 外部サービス（画像解析・コンテンツ生成）はスタブに差し替えてあり、
//! ネットワークなしで全経路（submit → dedup → consume → poll → fetch、
//! warm-up → cache hit → penetration block）を通します。

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::time::{Duration, sleep};

use cradle_core::app::{ConsumerGroup, ImageJobService, Reaper, spawn_warmup};
use cradle_core::cache::{CacheConfig, ContentError, TieredContentCache};
use cradle_core::domain::{JobStatusView, WeekContent};
use cradle_core::impls::{InMemorySharedCache, InMemoryWorkQueue, QueueDispatcher};
use cradle_core::ports::{
    ContentGenerator, FaceAnalyzer, RemoteError, SharedCache, SystemClock, UlidGenerator,
    WorkDispatcher, WorkQueue,
};
use cradle_core::registry::{JobRegistry, RegistryConfig, ResultFetch};

/// Stub for the slow image-blending worker: concatenates the two blobs
/// after a short artificial delay.
struct StubAnalyzer;

#[async_trait]
impl FaceAnalyzer for StubAnalyzer {
    async fn analyze(&self, parent_a: &[u8], parent_b: &[u8]) -> Result<Vec<u8>, RemoteError> {
        sleep(Duration::from_millis(300)).await;
        let mut out = parent_a.to_vec();
        out.extend_from_slice(parent_b);
        Ok(out)
    }
}

/// Stub for the rate-limited LLM backend: counts its calls so the demo
/// can show that cache hits never reach it.
struct StubContentGenerator {
    calls: AtomicU32,
}

#[async_trait]
impl ContentGenerator for StubContentGenerator {
    async fn generate(&self, week: u32) -> Result<WeekContent, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        sleep(Duration::from_millis(20)).await;
        Ok(WeekContent {
            development: Some(format!("week {week}: growing steadily")),
            tip: Some("rest well and stay hydrated".to_string()),
            ..WeekContent::bare(week)
        })
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // (A) ジョブ側の配線：registry + queue + dispatcher + consumers + reaper
    let registry = Arc::new(JobRegistry::new(
        Arc::new(UlidGenerator::new(SystemClock)),
        Arc::new(SystemClock),
        RegistryConfig::default(),
    ));
    let queue: Arc<dyn WorkQueue> = Arc::new(InMemoryWorkQueue::new());
    let dispatcher: Arc<dyn WorkDispatcher> =
        Arc::new(QueueDispatcher::new(Arc::clone(&queue)));
    let service = ImageJobService::new(Arc::clone(&registry), dispatcher);

    let consumers = ConsumerGroup::spawn(
        2,
        Arc::clone(&queue),
        Arc::clone(&registry),
        Arc::new(StubAnalyzer),
        Duration::from_secs(60),
    );
    let reaper = Reaper::spawn(Arc::clone(&registry), Duration::from_secs(60));

    // (B) 提出と重複排除
    let mom = b"mom-photo-bytes".to_vec();
    let dad = b"dad-photo-bytes".to_vec();

    let job_id = service.submit(mom.clone(), dad.clone()).await;
    println!("submitted job: {job_id}");

    // 同じ写真ペア（順序を入れ替えても）は同じジョブに解決される
    let duplicate = service.submit(dad.clone(), mom.clone()).await;
    println!("duplicate submission resolved to: {duplicate}");
    assert_eq!(job_id, duplicate);

    // (C) 完了をポーリングで待つ
    loop {
        let report = service.status(job_id).await.expect("job exists");
        println!("status: {:?}", report.status);
        if matches!(report.status, JobStatusView::Done | JobStatusView::Failed) {
            break;
        }
        sleep(Duration::from_millis(100)).await;
    }

    match service.result(job_id).await {
        ResultFetch::Ready(bytes) => println!("result: {} bytes", bytes.len()),
        other => println!("result not ready: {other:?}"),
    }
    println!("job counts: {:?}", service.counts().await);

    // (D) コンテンツキャッシュ：warm-up してから読む
    let generator = Arc::new(StubContentGenerator {
        calls: AtomicU32::new(0),
    });
    let cache = Arc::new(TieredContentCache::new(
        Arc::new(InMemorySharedCache::new()) as Arc<dyn SharedCache>,
        Arc::clone(&generator) as Arc<dyn ContentGenerator>,
        CacheConfig::default(),
    ));

    let loaded = spawn_warmup(Arc::clone(&cache), Duration::from_millis(5))
        .await
        .expect("warm-up task panicked");
    println!("warm-up loaded {loaded} weeks");

    // warm-up 後の読み取りは generator に到達しない
    let before = generator.calls.load(Ordering::SeqCst);
    let week12 = cache.get_week_content(12).await.unwrap();
    let week40 = cache.get_week_content(40).await.unwrap();
    println!("week 12: {:?}", week12.development);
    println!("week 40: {:?}", week40.development);
    assert_eq!(generator.calls.load(Ordering::SeqCst), before);

    // 不正な週は penetration guard で弾かれる（generator 呼び出しなし）
    match cache.get_week_content(99).await {
        Err(ContentError::InvalidWeek(week)) => println!("week {week} rejected"),
        other => println!("unexpected: {other:?}"),
    }

    // (E) graceful shutdown
    consumers.shutdown_and_join().await;
    reaper.shutdown_and_join().await;
    println!("done");
}
