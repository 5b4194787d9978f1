use std::{future::Future, sync::Arc};

use tokio::task::JoinHandle;

use super::{
    fetcher::{ConsentCookie, PageFetcher},
    parser::TranscriptParser,
    utils::strip_srv3,
};
use crate::common::{
    errors::{Result, TranscriptError},
    types::{CaptionTrack, Transcript},
};

/// Spawned track tasks of one retrieval.
///
/// Dropping the group aborts every task it still holds, which is how a
/// deadline or a dropped caller cancels in-flight fetches. `release` lets the
/// tasks run to completion on their own.
struct TaskGroup {
    handles: Vec<JoinHandle<()>>,
}

impl TaskGroup {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            handles: Vec::with_capacity(capacity),
        }
    }

    fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.handles.push(tokio::spawn(task));
    }

    fn release(mut self) {
        // Dropping a JoinHandle detaches the task.
        self.handles.clear();
    }
}

impl Drop for TaskGroup {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

/// Fetches and parses every selected track concurrently.
pub struct TrackProcessor {
    fetcher: Arc<PageFetcher>,
    parser: Arc<TranscriptParser>,
}

impl TrackProcessor {
    pub fn new(fetcher: Arc<PageFetcher>, parser: Arc<TranscriptParser>) -> Self {
        Self { fetcher, parser }
    }

    /// One task per track, all reporting into a channel sized to the track
    /// count.
    ///
    /// Returns on the first failure and discards whatever succeeded so far;
    /// the remaining tasks are left to finish and their results are dropped.
    /// The order of the returned transcripts is completion order, not the
    /// order of `tracks`.
    pub async fn process(
        &self,
        video_id: &str,
        tracks: Vec<CaptionTrack>,
        title: &str,
        preserve_formatting: bool,
        cookie: Option<ConsentCookie>,
    ) -> Result<Vec<Transcript>> {
        let expected = tracks.len();
        if expected == 0 {
            return Ok(Vec::new());
        }

        let (tx, rx) = flume::bounded::<Result<Transcript>>(expected);
        let mut group = TaskGroup::with_capacity(expected);

        for track in tracks {
            let tx = tx.clone();
            let fetcher = self.fetcher.clone();
            let parser = self.parser.clone();
            let cookie = cookie.clone();
            let video_id = video_id.to_string();
            let title = title.to_string();

            group.spawn(async move {
                let result = fetch_track(
                    &fetcher,
                    &parser,
                    &video_id,
                    &title,
                    &track,
                    preserve_formatting,
                    cookie,
                )
                .await;
                // The coordinator may already have returned; nobody listens then.
                let _ = tx.send_async(result).await;
            });
        }
        // Only the tasks hold senders now; the channel closes once all are done.
        drop(tx);

        let mut transcripts = Vec::with_capacity(expected);
        while let Ok(result) = rx.recv_async().await {
            match result {
                Ok(transcript) => transcripts.push(transcript),
                Err(e) => {
                    tracing::warn!(
                        "Track task for {} failed, dropping {} finished transcript(s): {}",
                        video_id,
                        transcripts.len(),
                        e
                    );
                    group.release();
                    return Err(e);
                }
            }
        }
        group.release();

        if transcripts.len() != expected {
            return Err(TranscriptError::TaskAborted {
                expected,
                received: transcripts.len(),
            });
        }

        Ok(transcripts)
    }
}

async fn fetch_track(
    fetcher: &PageFetcher,
    parser: &TranscriptParser,
    video_id: &str,
    title: &str,
    track: &CaptionTrack,
    preserve_formatting: bool,
    cookie: Option<ConsentCookie>,
) -> Result<Transcript> {
    let url = strip_srv3(&track.base_url);
    tracing::debug!("Fetching {} track for {}", track.language_code, video_id);

    let fetched = fetcher.fetch(&url, cookie).await?;
    let lines = parser
        .parse(&fetched.body, preserve_formatting)
        .map_err(|e| TranscriptError::Parse {
            language_code: track.language_code.clone(),
            reason: e.to_string(),
        })?;

    tracing::debug!(
        "Parsed {} lines for {} track of {}",
        lines.len(),
        track.language_code,
        video_id
    );

    Ok(Transcript::from_track(video_id, title, track, lines))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::atomic::{AtomicBool, Ordering},
        time::Duration,
    };

    fn delayed_flag(group: &mut TaskGroup) -> Arc<AtomicBool> {
        let flag = Arc::new(AtomicBool::new(false));
        let task_flag = flag.clone();
        group.spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            task_flag.store(true, Ordering::SeqCst);
        });
        flag
    }

    #[tokio::test]
    async fn test_dropped_group_aborts_tasks() {
        let mut group = TaskGroup::with_capacity(1);
        let flag = delayed_flag(&mut group);
        drop(group);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!flag.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_released_group_runs_to_completion() {
        let mut group = TaskGroup::with_capacity(1);
        let flag = delayed_flag(&mut group);
        group.release();

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(flag.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_no_tracks_no_tasks() {
        let config = crate::configs::TranscriptConfig::default();
        let fetcher = Arc::new(PageFetcher::new(
            Arc::new(reqwest::Client::new()),
            &config,
        ));
        let processor = TrackProcessor::new(fetcher, Arc::new(TranscriptParser::new()));

        let transcripts = processor
            .process("abc", Vec::new(), "", false, None)
            .await
            .unwrap();
        assert!(transcripts.is_empty());
    }
}
