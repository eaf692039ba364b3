// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Background rasterization.

use std::format;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::vec::Vec;

use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::raster::{RasterImage, RasterTarget, RasterUpload, ShapeRasterizer};
use crate::storage::PixelSink;

/// What a worker thread reports back for a job.
enum Outcome {
    Done(RasterUpload),
    Panicked(RasterTarget),
}

/// A small pool of threads rasterizing shapes in the background.
///
/// `render` turns a [`RasterTarget`] into pixels; it identifies the shape
/// by [`RasterTarget::key`]. Deferred requests are queued to the pool, and
/// the finished images are collected with [`take_completed`] or
/// [`finish`] and written with [`ShapeAtlas::apply_uploads`].
///
/// Dropping the worker closes the queue and joins every thread, waiting for
/// queued jobs to finish.
///
/// [`take_completed`]: Self::take_completed
/// [`finish`]: Self::finish
/// [`ShapeAtlas::apply_uploads`]: crate::ShapeAtlas::apply_uploads
pub struct RasterWorker<F> {
    render: Arc<F>,
    jobs: Option<Sender<RasterTarget>>,
    completed: Receiver<Outcome>,
    threads: Vec<JoinHandle<()>>,
    in_flight: usize,
}

impl<F> RasterWorker<F>
where
    F: Fn(&RasterTarget) -> RasterImage + Send + Sync + 'static,
{
    /// Spawns `threads` worker threads, at least one.
    pub fn new(threads: usize, render: F) -> std::io::Result<Self> {
        let render = Arc::new(render);
        let (job_tx, job_rx) = unbounded::<RasterTarget>();
        let (done_tx, done_rx) = unbounded();

        let count = threads.max(1);
        let mut handles = Vec::with_capacity(count);
        for index in 0..count {
            let jobs = job_rx.clone();
            let done = done_tx.clone();
            let render = Arc::clone(&render);
            let handle = std::thread::Builder::new()
                .name(format!("shape_raster_{index}"))
                .spawn(move || raster_loop(&*render, &jobs, &done))?;
            handles.push(handle);
        }
        log::debug!("started {count} raster worker threads");

        Ok(Self {
            render,
            jobs: Some(job_tx),
            completed: done_rx,
            threads: handles,
            in_flight: 0,
        })
    }

    /// Number of queued jobs whose result has not been collected yet.
    #[inline]
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Collects the uploads finished so far without blocking.
    pub fn take_completed(&mut self) -> Vec<RasterUpload> {
        let mut uploads = Vec::new();
        while let Ok(outcome) = self.completed.try_recv() {
            self.collect(outcome, &mut uploads);
        }
        uploads
    }

    /// Blocks until every queued job has finished and returns the uploads.
    pub fn finish(&mut self) -> Vec<RasterUpload> {
        let mut uploads = Vec::new();
        while self.in_flight > 0 {
            match self.completed.recv() {
                Ok(outcome) => self.collect(outcome, &mut uploads),
                Err(_) => {
                    log::error!(
                        "raster workers exited with {} jobs outstanding",
                        self.in_flight
                    );
                    self.in_flight = 0;
                }
            }
        }
        uploads
    }

    fn collect(&mut self, outcome: Outcome, uploads: &mut Vec<RasterUpload>) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match outcome {
            Outcome::Done(upload) => uploads.push(upload),
            Outcome::Panicked(target) => {
                log::error!("rasterizing {:?} panicked, dropping it", target.key);
            }
        }
    }
}

fn raster_loop<F>(render: &F, jobs: &Receiver<RasterTarget>, done: &Sender<Outcome>)
where
    F: Fn(&RasterTarget) -> RasterImage,
{
    for target in jobs.iter() {
        let outcome = match catch_unwind(AssertUnwindSafe(|| render(&target))) {
            Ok(image) => Outcome::Done(RasterUpload { target, image }),
            Err(_) => Outcome::Panicked(target),
        };
        if done.send(outcome).is_err() {
            break;
        }
    }
}

impl<S, F> ShapeRasterizer<S> for RasterWorker<F>
where
    S: PixelSink + ?Sized,
    F: Fn(&RasterTarget) -> RasterImage + Send + Sync + 'static,
{
    fn rasterize_blocking(&mut self, pages: &mut S, target: RasterTarget) {
        let image = (self.render)(&target);
        if let Err(err) = pages.write_pixels(target.page, target.offset, &image) {
            log::error!("failed to write {:?} into the atlas: {err}", target.key);
        }
    }

    fn rasterize_deferred(&mut self, pages: &mut S, target: RasterTarget) {
        let queued = self
            .jobs
            .as_ref()
            .is_some_and(|jobs| jobs.send(target).is_ok());
        if queued {
            self.in_flight += 1;
        } else {
            log::warn!(
                "raster workers are gone, rasterizing {:?} on the calling thread",
                target.key
            );
            self.rasterize_blocking(pages, target);
        }
    }
}

impl<F> Drop for RasterWorker<F> {
    fn drop(&mut self) {
        self.jobs = None;
        for handle in self.threads.drain(..) {
            if handle.join().is_err() {
                log::error!("raster worker thread panicked");
            }
        }
    }
}

impl<F> core::fmt::Debug for RasterWorker<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RasterWorker")
            .field("threads", &self.threads.len())
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}
