//! Extraction pipeline: validate, resolve, recognize, join.
//!
//! PDF pages are rasterized one at a time on the calling thread and handed
//! to a bounded set of workers for recognition. Results are put back into
//! page order before joining, so completion order never leaks into the
//! output.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;

use async_channel::Sender;
use image::DynamicImage;
use tracing::{debug, info, trace, warn};

use crate::error::{DecodeError, ExtractionError, OcrError, OcrProcessingError, Result};
use crate::format::{FormatResolver, ImageDecoder, RasterDecoder, Resolution};
use crate::models::request::{ExtractionRequest, OcrInput};
use crate::models::result::{ExtractionResult, RecognizedPage};
use crate::ocr::{EnginePool, Recognizer, RecognizerFactory};
use crate::pdf::{HayroRasterizer, PageStream, PdfRasterizer};

type Job = (usize, DynamicImage);
type Outcome = (usize, std::result::Result<String, ExtractionError>);

/// Text extraction for images and multi-page PDFs.
///
/// Stateless between calls apart from the engine pool; a single pipeline
/// can serve concurrent callers.
pub struct ExtractionPipeline<F: RecognizerFactory> {
    resolver: FormatResolver,
    engines: EnginePool<F>,
    max_workers: usize,
}

/// Builder for [`ExtractionPipeline`].
pub struct PipelineBuilder<F: RecognizerFactory> {
    factory: F,
    rasterizer: Option<Box<dyn PdfRasterizer>>,
    decoder: Option<Box<dyn RasterDecoder>>,
    max_workers: usize,
}

impl<F: RecognizerFactory> PipelineBuilder<F> {
    /// Set the PDF rasterizer.
    pub fn with_rasterizer(mut self, rasterizer: impl PdfRasterizer + 'static) -> Self {
        self.rasterizer = Some(Box::new(rasterizer));
        self
    }

    /// Set the raster image decoder.
    pub fn with_decoder(mut self, decoder: impl RasterDecoder + 'static) -> Self {
        self.decoder = Some(Box::new(decoder));
        self
    }

    /// Set how many pages may be recognized at once.
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    /// Build the pipeline. Engines are loaded lazily on first use.
    pub fn build(self) -> ExtractionPipeline<F> {
        let rasterizer: Box<dyn PdfRasterizer> = match self.rasterizer {
            Some(rasterizer) => rasterizer,
            None => Box::new(HayroRasterizer::default()),
        };
        let decoder: Box<dyn RasterDecoder> = match self.decoder {
            Some(decoder) => decoder,
            None => Box::new(ImageDecoder),
        };

        ExtractionPipeline {
            resolver: FormatResolver::new(rasterizer, decoder),
            engines: EnginePool::new(self.factory, self.max_workers),
            max_workers: self.max_workers,
        }
    }
}

impl<F: RecognizerFactory> ExtractionPipeline<F> {
    /// Start building a pipeline around a recognizer factory.
    pub fn builder(factory: F) -> PipelineBuilder<F> {
        PipelineBuilder {
            factory,
            rasterizer: None,
            decoder: None,
            max_workers: 1,
        }
    }

    /// The engine pool backing this pipeline.
    pub fn engines(&self) -> &EnginePool<F> {
        &self.engines
    }

    /// Extract the joined text of a document.
    pub fn extract(&self, request: ExtractionRequest) -> Result<String> {
        self.extract_pages(request).map(|result| result.text())
    }

    /// Extract text from the wire form of a request.
    pub fn extract_input(&self, input: OcrInput) -> Result<String> {
        let request = ExtractionRequest::try_from(input).map_err(Self::fail)?;
        self.extract(request)
    }

    /// Extract a document page by page.
    pub fn extract_pages(&self, request: ExtractionRequest) -> Result<ExtractionResult> {
        let start = Instant::now();
        let result = self.run(request).map_err(Self::fail)?;

        info!(
            "Extracted {} page(s) as {:?} in {}ms",
            result.page_count(),
            result.format,
            start.elapsed().as_millis()
        );
        Ok(result)
    }

    fn fail(err: ExtractionError) -> OcrProcessingError {
        warn!("OCR processing failed: {}", err);
        OcrProcessingError::from(err)
    }

    fn run(&self, request: ExtractionRequest) -> std::result::Result<ExtractionResult, ExtractionError> {
        let input = self.resolver.load(request)?;

        match self.resolver.resolve(&input)? {
            Resolution::Image(image) => {
                let text = self.recognize_image(&image, None)?;
                Ok(ExtractionResult::image(text))
            }
            Resolution::Pdf(pages) => {
                let pages = self.recognize_pages(pages)?;
                Ok(ExtractionResult::pdf(pages))
            }
        }
    }

    fn recognize_image(
        &self,
        image: &DynamicImage,
        page: Option<usize>,
    ) -> std::result::Result<String, ExtractionError> {
        let engine = self
            .engines
            .acquire()
            .map_err(|e| ExtractionError::from_ocr(page, e))?;

        match panic::catch_unwind(AssertUnwindSafe(|| engine.recognize(image))) {
            Ok(outcome) => outcome.map_err(|e| ExtractionError::from_ocr(page, e)),
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                warn!("Recognizer panicked, discarding engine: {}", reason);
                engine.discard();
                Err(ExtractionError::from_ocr(
                    page,
                    OcrError::Recognition(format!("recognizer panicked: {}", reason)),
                ))
            }
        }
    }

    fn recognize_pages(
        &self,
        pages: PageStream<'_>,
    ) -> std::result::Result<Vec<RecognizedPage>, ExtractionError> {
        let workers = self.max_workers;
        let (job_tx, job_rx) = async_channel::bounded::<Job>(workers);
        let (done_tx, done_rx) = async_channel::unbounded::<Outcome>();
        let failed = AtomicBool::new(false);

        let fed = thread::scope(|scope| {
            for worker in 0..workers {
                let job_rx = job_rx.clone();
                let done_tx = done_tx.clone();
                let failed = &failed;
                scope.spawn(move || {
                    while let Ok((index, image)) = job_rx.recv_blocking() {
                        trace!("Worker {} recognizing page {}", worker, index + 1);
                        let outcome = self.recognize_image(&image, Some(index));
                        if outcome.is_err() {
                            failed.store(true, Ordering::Relaxed);
                        }
                        if done_tx.send_blocking((index, outcome)).is_err() {
                            break;
                        }
                    }
                });
            }

            // Only workers hold the receiver, so sends fail if they all exit.
            drop(job_rx);
            drop(done_tx);
            Self::feed(pages, job_tx, &failed)
        });

        let mut outcomes = Vec::with_capacity(done_rx.len());
        while let Ok(outcome) = done_rx.try_recv() {
            outcomes.push(outcome);
        }
        outcomes.sort_by_key(|(index, _)| *index);

        // Lowest failing page wins; pages are never dropped from the result.
        let mut recognized = Vec::with_capacity(outcomes.len());
        for (index, outcome) in outcomes {
            recognized.push(RecognizedPage {
                index,
                text: outcome?,
            });
        }

        let fed = fed?;
        debug!("Recognized {} of {} page(s)", recognized.len(), fed);
        Ok(recognized)
    }

    /// Rasterize pages in order and queue them for recognition.
    fn feed(
        pages: PageStream<'_>,
        jobs: Sender<Job>,
        failed: &AtomicBool,
    ) -> std::result::Result<usize, ExtractionError> {
        let mut fed = 0;
        for (index, page) in pages.enumerate() {
            if failed.load(Ordering::Relaxed) {
                debug!("Stopping after a recognition failure");
                break;
            }

            let image = page.map_err(|source| DecodeError::Page { index, source })?;
            if jobs.send_blocking((index, image)).is_err() {
                break;
            }
            fed += 1;
        }
        Ok(fed)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(feature = "native")]
impl ExtractionPipeline<crate::ocr::PureEngineFactory> {
    /// Build a pipeline backed by `pure-onnx-ocr` from configuration.
    pub fn from_config(config: &crate::models::config::DocscanConfig) -> Self {
        ExtractionPipeline::builder(crate::ocr::PureEngineFactory::new(config.ocr.clone()))
            .with_rasterizer(HayroRasterizer::new(config.pdf.render_dpi))
            .with_max_workers(config.pipeline.max_workers)
            .build()
    }
}
