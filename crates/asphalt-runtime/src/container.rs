//! Stages shared by the map and style pipelines.

use asphalt_format::{ChunkReader, ChunkRecord, ChunkTag};
use asphalt_map::MapDataBuilder;
use asphalt_style::StyleDataBuilder;

use crate::error::PipelineError;
use crate::fetch::{AssetSource, AssetStream, FetchPoll};
use crate::step::{Progress, Stage, Step};

/// Polls an asset stream, one poll per step.
pub(crate) struct FetchStage {
    label: String,
    stream: Box<dyn AssetStream>,
}

impl FetchStage {
    pub(crate) fn open(source: &dyn AssetSource, name: &str) -> Result<Self, PipelineError> {
        Ok(Self {
            label: format!("Downloading {}", name),
            stream: source.open(name)?,
        })
    }
}

impl Stage for FetchStage {
    type Output = Vec<u8>;

    fn step(&mut self) -> Result<Step<Vec<u8>>, PipelineError> {
        Ok(match self.stream.poll()? {
            FetchPoll::Pending { loaded, total } => {
                Step::Pending(Progress::new(loaded, total.unwrap_or(0), self.label.as_str()))
            }
            FetchPoll::Ready(bytes) => Step::Done(bytes),
        })
    }
}

/// Receives chunks in file order.
pub(crate) trait ChunkConsumer {
    /// Returns false for chunks it does not recognise.
    fn accept(&mut self, chunk: ChunkRecord<'_>) -> bool;
}

impl ChunkConsumer for MapDataBuilder {
    fn accept(&mut self, chunk: ChunkRecord<'_>) -> bool {
        MapDataBuilder::accept(self, chunk)
    }
}

impl ChunkConsumer for StyleDataBuilder {
    fn accept(&mut self, chunk: ChunkRecord<'_>) -> bool {
        StyleDataBuilder::accept(self, chunk)
    }
}

/// Feeds one chunk per step to a consumer and yields it at end of input.
pub(crate) struct ChunkStage<C> {
    data: Vec<u8>,
    pos: usize,
    consumer: Option<C>,
    label: &'static str,
    chunks: usize,
    skipped: usize,
}

impl<C: ChunkConsumer> ChunkStage<C> {
    /// Validates the header up front; a mismatch fails before any stepping.
    pub(crate) fn open(
        data: Vec<u8>,
        magic: ChunkTag,
        version: u16,
        consumer: C,
        label: &'static str,
    ) -> Result<Self, PipelineError> {
        let pos = ChunkReader::open(&data, magic, version)?.position();
        Ok(Self {
            data,
            pos,
            consumer: Some(consumer),
            label,
            chunks: 0,
            skipped: 0,
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.data.len()
    }
}

impl<C: ChunkConsumer> Stage for ChunkStage<C> {
    type Output = C;

    fn step(&mut self) -> Result<Step<C>, PipelineError> {
        let Some(consumer) = self.consumer.as_mut() else {
            return Err(PipelineError::Finished);
        };
        let mut reader = ChunkReader::resume(&self.data, self.pos);
        match reader.next_chunk() {
            None => {
                log::debug!(
                    target: "runtime",
                    "{}: {} chunks, {} skipped",
                    self.label,
                    self.chunks,
                    self.skipped
                );
                self.consumer.take().map(Step::Done).ok_or(PipelineError::Finished)
            }
            Some(Err(e)) => {
                self.consumer = None;
                Err(e.into())
            }
            Some(Ok(chunk)) => {
                if !consumer.accept(chunk) {
                    self.skipped += 1;
                }
                self.chunks += 1;
                self.pos = reader.position();
                Ok(Step::Pending(Progress::new(
                    self.pos as u64,
                    self.data.len() as u64,
                    self.label,
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asphalt_format::{ContainerWriter, FormatError};

    #[derive(Default)]
    struct Tags(Vec<ChunkTag>);

    impl ChunkConsumer for Tags {
        fn accept(&mut self, chunk: ChunkRecord<'_>) -> bool {
            self.0.push(chunk.tag);
            chunk.tag != ChunkTag::new(b"SKIP")
        }
    }

    #[test]
    fn one_chunk_per_step_then_done() {
        let bytes = ContainerWriter::new(b"TEST", 1)
            .chunk(b"AAAA", &[1, 2])
            .chunk(b"SKIP", &[3])
            .finish();
        let mut stage =
            ChunkStage::open(bytes, ChunkTag::new(b"TEST"), 1, Tags::default(), "t").unwrap();
        let len = stage.len() as u64;
        match stage.step().unwrap() {
            Step::Pending(p) => assert_eq!((p.progress, p.max), (16, len)),
            Step::Done(_) => panic!("finished early"),
        }
        assert!(!stage.step().unwrap().is_done());
        match stage.step().unwrap() {
            Step::Done(tags) => assert_eq!(tags.0.len(), 2),
            Step::Pending(_) => panic!("expected the consumer"),
        }
        assert_eq!(stage.skipped, 1);
        assert!(matches!(stage.step(), Err(PipelineError::Finished)));
    }

    #[test]
    fn corrupt_tag_is_fatal() {
        let mut w = ContainerWriter::new(b"TEST", 1);
        w.raw(b"1ABC").raw(&0u32.to_le_bytes());
        let mut stage =
            ChunkStage::open(w.finish(), ChunkTag::new(b"TEST"), 1, Tags::default(), "t")
                .unwrap();
        assert!(matches!(
            stage.step(),
            Err(PipelineError::Format(FormatError::CorruptStream { .. }))
        ));
        assert!(matches!(stage.step(), Err(PipelineError::Finished)));
    }
}
