use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, TryRecvError, bounded};

use crate::RenderError;
use crate::frame::Frame;
use crate::renderer::Renderer;
use crate::scene::{ApplyStats, RenderScene};

/// A consumed frame coming back from the render thread.
#[derive(Debug)]
pub struct FrameReport<O> {
    /// Emptied frame, to be handed to
    /// [`RenderBackendService::recycle_frame`](crate::RenderBackendService::recycle_frame).
    pub frame: Frame,
    pub applied: ApplyStats,
    /// Renderer output, or the apply error that stopped rendering this frame.
    pub output: Result<O, RenderError>,
}

impl<O> FrameReport<O> {
    pub fn sequence(&self) -> u64 {
        self.applied.sequence
    }
}

/// Consumer thread owning a [`RenderScene`] and a renderer.
///
/// Frames go in through a bounded channel and come back as
/// [`FrameReport`]s in submission order.
pub struct RenderThread<O> {
    frames: Option<Sender<Frame>>,
    reports: Receiver<FrameReport<O>>,
    handle: Option<JoinHandle<RenderScene>>,
}

impl<O: Send + 'static> RenderThread<O> {
    /// Starts the thread. `capacity` bounds frames queued in each direction.
    pub fn spawn<R>(mut renderer: R, capacity: usize) -> Result<Self, RenderError>
    where
        R: Renderer<Output = O> + Send + 'static,
    {
        let (frame_tx, frame_rx) = bounded::<Frame>(capacity.max(1));
        let (report_tx, report_rx) = bounded::<FrameReport<O>>(capacity.max(1));

        let handle = std::thread::Builder::new()
            .name("framepipe-render".into())
            .spawn(move || {
                let mut scene = RenderScene::new();
                for mut frame in frame_rx {
                    let (applied, output) = match scene.apply(&mut frame) {
                        Ok(stats) => {
                            let out = renderer.render(&scene);
                            scene.clear_dirty();
                            (stats, Ok(out))
                        }
                        Err(e) => {
                            tracing::error!(error = %e, sequence = frame.sequence(), "frame apply failed");
                            frame.reset();
                            let stats = ApplyStats {
                                sequence: frame.sequence(),
                                ..ApplyStats::default()
                            };
                            (stats, Err(e))
                        }
                    };
                    let report = FrameReport {
                        frame,
                        applied,
                        output,
                    };
                    if report_tx.send(report).is_err() {
                        tracing::debug!("report receiver gone, stopping render thread");
                        break;
                    }
                }
                tracing::debug!(frames = scene.frames_applied(), "render thread exiting");
                scene
            })
            .map_err(RenderError::Spawn)?;

        Ok(Self {
            frames: Some(frame_tx),
            reports: report_rx,
            handle: Some(handle),
        })
    }

    /// Queues `frame`, blocking while the channel is full.
    pub fn submit(&self, frame: Frame) -> Result<(), RenderError> {
        let tx = self.frames.as_ref().ok_or(RenderError::ThreadGone)?;
        tx.send(frame).map_err(|_| RenderError::ThreadGone)
    }

    /// Blocks until the next frame comes back.
    pub fn recv_report(&self) -> Result<FrameReport<O>, RenderError> {
        self.reports.recv().map_err(|_| RenderError::ThreadGone)
    }

    pub fn try_recv_report(&self) -> Result<Option<FrameReport<O>>, RenderError> {
        match self.reports.try_recv() {
            Ok(r) => Ok(Some(r)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(RenderError::ThreadGone),
        }
    }

    /// Closes the frame channel and joins the thread, returning its scene.
    ///
    /// Reports still queued are discarded.
    pub fn shutdown(mut self) -> Result<RenderScene, RenderError> {
        self.frames.take();
        let handle = self.handle.take().ok_or(RenderError::ThreadGone)?;
        // the thread drops its sender on exit, which ends this loop
        while self.reports.recv().is_ok() {}
        handle.join().map_err(|_| RenderError::ThreadGone)
    }
}

impl<O> Drop for RenderThread<O> {
    fn drop(&mut self) {
        self.frames.take();
        if let Some(handle) = self.handle.take() {
            while self.reports.recv().is_ok() {}
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::DebugTextRenderer;
    use crate::service::RenderBackendService;

    #[test]
    fn frames_round_trip_in_order() {
        let mut svc = RenderBackendService::default();
        let thread = RenderThread::spawn(DebugTextRenderer::new(), 2).unwrap();

        for i in 0..5 {
            svc.begin_pass("main").unwrap();
            svc.begin_render_batch(&format!("batch{i}")).unwrap();
            svc.end_render_batch().unwrap();
            svc.end_pass().unwrap();
            let frame = svc.commit_next_frame().unwrap();
            thread.submit(frame).unwrap();

            let report = thread.recv_report().unwrap();
            assert_eq!(report.sequence(), i + 1);
            assert!(report.output.unwrap().contains(&format!("batch batch{i}")));
            assert_eq!(report.frame.num_cmds(), 0);
            svc.recycle_frame(report.frame);
        }

        let scene = thread.shutdown().unwrap();
        assert_eq!(scene.frames_applied(), 5);
        assert_eq!(scene.num_batches(), 5);
    }

    #[test]
    fn drop_joins_idle_thread() {
        let thread = RenderThread::spawn(DebugTextRenderer::new(), 1).unwrap();
        assert!(thread.try_recv_report().unwrap().is_none());
        drop(thread);
    }
}
