//! Store behavior under parallel producers and workers.

use std::collections::HashSet;
use std::sync::Arc;

use vnote_models::{JobRequest, ProgressUpdate, Stage};
use vnote_queue::JobStore;

const JOBS: usize = 200;
const WORKERS: usize = 8;

async fn assert_positions_contiguous(store: &JobStore) {
    let mut positions: Vec<u32> = store
        .list()
        .await
        .into_iter()
        .filter(|job| job.stage == Stage::Queued)
        .map(|job| job.position.expect("queued job without position"))
        .collect();
    positions.sort_unstable();
    let expected: Vec<u32> = (1..=positions.len() as u32).collect();
    assert_eq!(positions, expected);

    for job in store.list().await {
        if job.stage != Stage::Queued {
            assert!(job.position.is_none(), "non-queued job {} has a position", job.job_id);
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_claims_are_exclusive() {
    let store = Arc::new(JobStore::default());
    for i in 0..JOBS {
        store
            .create(JobRequest::new(format!("file-{i}"), 0.0, 10.0))
            .await
            .unwrap();
    }

    let mut handles = Vec::new();
    for _ in 0..WORKERS {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let mut claimed = Vec::new();
            while let Some(job) = store.dequeue().await {
                assert_eq!(job.stage, Stage::Processing);
                claimed.push(job.job_id);
            }
            claimed
        }));
    }

    let mut seen = HashSet::new();
    let mut total = 0;
    for handle in handles {
        for job_id in handle.await.unwrap() {
            total += 1;
            assert!(seen.insert(job_id.clone()), "job {job_id} claimed twice");
        }
    }

    assert_eq!(total, JOBS);
    assert_eq!(store.pending_len().await, 0);
    assert_positions_contiguous(&store).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_positions_stay_contiguous_under_mixed_load() {
    let store = Arc::new(JobStore::default());

    let producers: Vec<_> = (0..4)
        .map(|p| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                for i in 0..50 {
                    store
                        .create(JobRequest::new(format!("file-{p}-{i}"), 0.0, 30.0))
                        .await
                        .unwrap();
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    let workers: Vec<_> = (0..4)
        .map(|w| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                for round in 0..60 {
                    if let Some(job) = store.dequeue().await {
                        let update = match (w + round) % 3 {
                            0 => ProgressUpdate::stage(Stage::Queued),
                            1 => ProgressUpdate::done(format!("local://{}.mp4", job.job_id)),
                            _ => ProgressUpdate::failed("encoder crashed"),
                        };
                        store.update(&job.job_id, update).await.unwrap();
                    }
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    for handle in producers.into_iter().chain(workers) {
        handle.await.unwrap();
    }

    assert_positions_contiguous(&store).await;
    let stats = store.stats().await;
    assert_eq!(stats.total, 200);
    assert_eq!(stats.pending, stats.by_stage[&Stage::Queued]);
    assert_eq!(stats.by_stage[&Stage::Processing], 0);
}

#[tokio::test]
async fn test_claim_order_follows_enqueue_order() {
    let store = JobStore::default();
    let first = store.create(JobRequest::new("a", 0.0, 10.0)).await.unwrap();
    let second = store.create(JobRequest::new("b", 0.0, 10.0)).await.unwrap();
    let third = store.create(JobRequest::new("c", 0.0, 10.0)).await.unwrap();

    let claimed = store.dequeue().await.unwrap();
    assert_eq!(claimed.job_id, first.job_id);
    store
        .update(&claimed.job_id, ProgressUpdate::stage(Stage::Queued))
        .await
        .unwrap();

    let order: Vec<_> = [
        store.dequeue().await.unwrap().job_id,
        store.dequeue().await.unwrap().job_id,
        store.dequeue().await.unwrap().job_id,
    ]
    .into();
    assert_eq!(order, vec![second.job_id, third.job_id, first.job_id]);
}
