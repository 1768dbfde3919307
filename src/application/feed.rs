// Feed trait - producers that push SIRN data into a running visualizer
use crate::application::visualizer::SirnVisualizer;
use async_trait::async_trait;
use std::time::Duration;

/// All points reported for one time.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedStep {
    pub time: f64,
    pub points: Vec<(String, [f64; 4])>,
}

#[async_trait]
pub trait SirnFeed: Send {
    /// Cities in display order; empty leaves the order to first appearance.
    fn roster(&self) -> Vec<String>;

    /// The next time's points, or `None` once the source is exhausted.
    async fn next_step(&mut self) -> anyhow::Result<Option<FeedStep>>;
}

/// Push every step of `feed` into `visualizer`, pausing `delay` between steps.
///
/// Stops early when the visualizer is closed. Rejected points are reported by the
/// visualizer itself and do not stop the feed. Returns the number of steps delivered.
pub async fn drive_feed(
    visualizer: SirnVisualizer,
    mut feed: Box<dyn SirnFeed>,
    delay: Duration,
) -> anyhow::Result<usize> {
    let roster = feed.roster();
    if !roster.is_empty() {
        visualizer.initialize(&roster)?;
    }

    let mut delivered = 0;
    while !visualizer.is_closed() {
        let Some(step) = feed.next_step().await? else {
            break;
        };
        tracing::debug!("Feeding {} points at t={}", step.points.len(), step.time);
        for (city, values) in &step.points {
            // already logged and shown as a notice
            let _ = visualizer.add_data_point(city, step.time, values);
        }
        delivered += 1;

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = visualizer.wait_for_close() => break,
        }
    }

    tracing::info!("Feed finished after {} steps", delivered);
    Ok(delivered)
}
