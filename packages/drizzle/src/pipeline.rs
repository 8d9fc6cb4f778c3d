//! The animation pipeline and the collaborators it drives.
//!
//! ```text
//!   timer ──()──▶ new drops ──▶ generator ──droplet──▶ drops ──▶ chunker ──batch──▶ ticks
//!                                                       ▲                            │
//!                                                       └──────── animator ◀─────────┘
//! ```
//!
//! Every stage is its own task and the stages only talk through [`Channel`]s.

use crate::{
    Channel,
    chunk::chunked_channel,
    config::{ConfigError, PipelineConfig},
    droplet::{Droplet, merge::reduce_all},
    timer::timer_channel,
    util::AbortOnDrop,
};
use std::time::Duration;
use tokio::task::JoinError;


/// Draws droplets
pub trait Renderer {
    /// Erase whatever was drawn for `droplet` on the previous frame.
    fn erase(&mut self, droplet: &Droplet);

    /// Draw `droplet`, which advanced from `prior` this frame.
    fn draw(&mut self, droplet: &Droplet, prior: &Droplet);

    /// Called once per frame, after every droplet has been drawn.
    fn present(&mut self) {}
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn erase(&mut self, droplet: &Droplet) {
        (**self).erase(droplet)
    }

    fn draw(&mut self, droplet: &Droplet, prior: &Droplet) {
        (**self).draw(droplet, prior)
    }

    fn present(&mut self) {
        (**self).present()
    }
}

/// Decides which droplets are still worth animating
pub trait Viewport {
    /// Whether the droplet is at least partly within the visible region.
    fn is_visible(&self, droplet: &Droplet) -> bool;
}

impl<F: Fn(&Droplet) -> bool> Viewport for F {
    fn is_visible(&self, droplet: &Droplet) -> bool {
        self(droplet)
    }
}

/// Makes new droplets
pub trait DropletFactory {
    /// Construct a fresh droplet.
    fn next_droplet(&mut self) -> Droplet;
}

impl<F: FnMut() -> Droplet> DropletFactory for F {
    fn next_droplet(&mut self) -> Droplet {
        self()
    }
}


/// Counts from a finished pipeline
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Droplets the factory made and the drop channel accepted
    pub generated: u64,
    /// Batches animated
    pub frames: u64,
}

/// A running animation pipeline
///
/// Dropping it without [`join`](Self::join)ing closes its channels and aborts its tasks.
pub struct Pipeline {
    new_drops: Channel<()>,
    drops: Channel<Droplet>,
    generator: AbortOnDrop<u64>,
    animator: AbortOnDrop<u64>,
}

impl Pipeline {
    /// Spawn the pipeline's tasks onto the current tokio runtime
    ///
    /// - `delay` picks the wait before each new droplet. It is called again for every droplet.
    /// - `factory` makes each new droplet.
    /// - `viewport` decides which droplets are still animated.
    /// - `renderer` is called for every animated droplet, every frame.
    pub fn spawn<D, F, V, R>(
        config: &PipelineConfig,
        delay: D,
        factory: F,
        viewport: V,
        renderer: R,
    ) -> Result<Self, ConfigError>
    where
        D: FnMut() -> Duration + Send + 'static,
        F: DropletFactory + Send + 'static,
        V: Viewport + Send + 'static,
        R: Renderer + Send + 'static,
    {
        config.validate()?;

        let new_drops = timer_channel(delay, ());
        let drops = Channel::with_overflow(config.max_drops, config.overflow);
        let ticks = chunked_channel(drops.clone(), config.window());

        let generator = AbortOnDrop::spawn(generate(new_drops.clone(), drops.clone(), factory));
        let animator = AbortOnDrop::spawn(
            animate(ticks, drops.clone(), viewport, renderer, config.gravity)
        );

        debug!(
            frame_rate = config.frame_rate,
            max_drops = config.max_drops,
            overflow = ?config.overflow,
            "pipeline spawned",
        );
        Ok(Pipeline { new_drops, drops, generator, animator })
    }

    /// The channel of droplets waiting to be animated
    ///
    /// Putting a droplet into it injects that droplet into the next frame.
    pub fn drops(&self) -> &Channel<Droplet> {
        &self.drops
    }

    /// Stop generating droplets and wind the pipeline down
    ///
    /// Droplets already waiting are animated one last time, after which every task finishes.
    pub fn close(&self) {
        debug!("closing pipeline");
        self.new_drops.close();
        self.drops.close();
    }

    /// Whether [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        self.drops.is_closed()
    }

    /// Wait for every task to finish
    ///
    /// Only finishes after [`close`](Self::close). Fails if a task panicked.
    pub async fn join(mut self) -> Result<PipelineStats, JoinError> {
        let generated = (&mut self.generator).await?;
        let frames = (&mut self.animator).await?;
        Ok(PipelineStats { generated, frames })
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        // the timer and chunker tasks are detached, closing their channels is what stops them
        self.new_drops.close();
        self.drops.close();
    }
}

/// Animate one batch of droplets and return the ones to put back
///
/// Invisible droplets are discarded, the rest are erased, merged where they overlap, advanced one
/// physics step, and drawn, in that order. The renderer is presented once at the end.
pub fn animate_tick<V, R>(
    batch: Vec<Droplet>,
    viewport: &V,
    renderer: &mut R,
    gravity: f64,
) -> Vec<Droplet>
where
    V: Viewport + ?Sized,
    R: Renderer + ?Sized,
{
    let visible: Vec<Droplet> = batch.into_iter()
        .filter(|droplet| viewport.is_visible(droplet))
        .collect();
    for droplet in &visible {
        renderer.erase(droplet);
    }

    let visible_len = visible.len();
    let merged = reduce_all(visible);
    if merged.len() < visible_len {
        trace!(merges = visible_len - merged.len(), "droplets merged");
    }

    let next = merged.iter()
        .map(|prior| {
            let droplet = prior.fall(gravity);
            renderer.draw(&droplet, prior);
            droplet
        })
        .collect();
    renderer.present();
    next
}

// put a new droplet into drops every time new_drops yields. returns the number generated.
async fn generate<F>(new_drops: Channel<()>, drops: Channel<Droplet>, mut factory: F) -> u64
where
    F: DropletFactory,
{
    let mut generated = 0;
    while let Some(()) = new_drops.take().await {
        match drops.put(factory.next_droplet()) {
            Ok(_) => generated += 1,
            Err(e) if e.is_closed() => break,
            Err(_) => trace!("drop channel full, discarding new droplet"),
        }
    }
    // also stops the timer, if drops closed first
    new_drops.close();
    debug!(generated, "droplet generator stopped");
    generated
}

// animate every batch from ticks and put the survivors back into drops. returns the number of
// batches animated.
async fn animate<V, R>(
    ticks: Channel<Vec<Droplet>>,
    drops: Channel<Droplet>,
    viewport: V,
    mut renderer: R,
    gravity: f64,
) -> u64
where
    V: Viewport,
    R: Renderer,
{
    let mut frames = 0;
    while let Some(batch) = ticks.take().await {
        frames += 1;
        for droplet in animate_tick(batch, &viewport, &mut renderer, gravity) {
            if let Err(e) = drops.put(droplet) {
                if e.is_closed() {
                    break;
                }
            }
        }
    }
    debug!(frames, "animator stopped");
    frames
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::droplet::merge::merge;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
        Mutex,
    };
    use tokio::time::sleep;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Erase(Droplet),
        Draw(Droplet, Droplet),
        Present,
    }

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<Call>>>);

    impl Recorder {
        fn calls(&self) -> Vec<Call> {
            self.0.lock().unwrap().clone()
        }

        fn frames(&self) -> Vec<Vec<(Droplet, Droplet)>> {
            let mut frames = vec![Vec::new()];
            for call in self.calls() {
                match call {
                    Call::Draw(droplet, prior) => frames.last_mut().unwrap().push((droplet, prior)),
                    Call::Present => frames.push(Vec::new()),
                    Call::Erase(_) => (),
                }
            }
            frames.pop();
            frames
        }
    }

    impl Renderer for Recorder {
        fn erase(&mut self, droplet: &Droplet) {
            self.0.lock().unwrap().push(Call::Erase(*droplet));
        }

        fn draw(&mut self, droplet: &Droplet, prior: &Droplet) {
            self.0.lock().unwrap().push(Call::Draw(*droplet, *prior));
        }

        fn present(&mut self) {
            self.0.lock().unwrap().push(Call::Present);
        }
    }

    fn above_100(droplet: &Droplet) -> bool {
        droplet.y - droplet.r < 100.0
    }

    #[test]
    fn tick_filters_erases_merges_then_draws() {
        let a = Droplet::new(10.0, 10.0, 5.0);
        let b = Droplet::new(12.0, 10.0, 5.0);
        let gone = Droplet::new(50.0, 200.0, 3.0);
        let lone = Droplet::new(80.0, 50.0, 2.0);

        let mut recorder = Recorder::default();
        let next = animate_tick(vec![a, gone, b, lone], &above_100, &mut recorder, 0.005);

        let merged = merge(&b, &a);
        assert_eq!(next, vec![merged.fall(0.005), lone.fall(0.005)]);
        assert_eq!(recorder.calls(), vec![
            Call::Erase(a),
            Call::Erase(b),
            Call::Erase(lone),
            Call::Draw(merged.fall(0.005), merged),
            Call::Draw(lone.fall(0.005), lone),
            Call::Present,
        ]);
    }

    #[test]
    fn tick_with_nothing_visible_still_presents() {
        let mut recorder = Recorder::default();
        let next = animate_tick(vec![Droplet::new(0.0, 500.0, 1.0)], &above_100, &mut recorder, 0.005);
        assert!(next.is_empty());
        assert_eq!(recorder.calls(), vec![Call::Present]);
    }

    #[tokio::test(start_paused = true)]
    async fn injected_droplet_falls_every_frame() {
        let recorder = Recorder::default();
        let pipeline = Pipeline::spawn(
            &PipelineConfig::default(),
            || Duration::from_secs(3600),
            || -> Droplet { unreachable!("no droplet should be generated") },
            above_100,
            recorder.clone(),
        ).unwrap();

        pipeline.drops().put(Droplet::new(5.0, 0.0, 2.0)).unwrap();
        sleep(Duration::from_millis(400)).await;
        pipeline.close();
        let stats = pipeline.join().await.unwrap();
        assert_eq!(stats.generated, 0);

        let frames = recorder.frames();
        assert!(frames.len() >= 8, "only {} frames", frames.len());
        assert_eq!(stats.frames as usize, frames.len());
        let mut prev_y = 0.0;
        for frame in frames {
            assert_eq!(frame.len(), 1);
            let (droplet, prior) = frame[0];
            assert_eq!(droplet, prior.fall(crate::droplet::GRAVITY));
            assert!(droplet.y > prev_y);
            prev_y = droplet.y;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn generated_droplets_are_animated_until_close() {
        let recorder = Recorder::default();
        let mut n = 0.0;
        let pipeline = Pipeline::spawn(
            &PipelineConfig::default(),
            || Duration::from_millis(20),
            move || {
                // spaced so they never merge
                n += 10.0;
                Droplet::new(n, 0.0, 1.0)
            },
            above_100,
            recorder.clone(),
        ).unwrap();

        sleep(Duration::from_millis(500)).await;
        assert!(!pipeline.is_closed());
        pipeline.close();
        let stats = pipeline.join().await.unwrap();

        assert!(stats.generated >= 20, "only {} generated", stats.generated);
        assert!(stats.frames > 0);
        let frames = recorder.frames();
        let max_drawn = frames.iter().map(Vec::len).max().unwrap_or(0);
        assert!(max_drawn >= 10, "at most {} drawn per frame", max_drawn);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_pipeline_stops_timer() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::spawn(
            &PipelineConfig::default(),
            {
                let calls = calls.clone();
                move || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Duration::from_millis(20)
                }
            },
            Droplet::default,
            above_100,
            Recorder::default(),
        ).unwrap();

        sleep(Duration::from_millis(100)).await;
        let drops = pipeline.drops().clone();
        drop(pipeline);
        assert!(drops.is_closed());

        let at_drop = calls.load(Ordering::SeqCst);
        assert!(at_drop > 0);
        sleep(Duration::from_secs(10)).await;
        assert_eq!(calls.load(Ordering::SeqCst), at_drop);
    }

    #[tokio::test]
    async fn invalid_config_is_rejected() {
        let config = PipelineConfig { frame_rate: 0.0, ..Default::default() };
        let result = Pipeline::spawn(
            &config,
            || Duration::from_millis(20),
            Droplet::default,
            above_100,
            Recorder::default(),
        );
        assert!(matches!(result, Err(ConfigError::FrameRate(_))));
    }
}
