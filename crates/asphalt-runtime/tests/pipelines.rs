use std::fs;
use std::sync::Arc;

use asphalt_format::{ContainerWriter, FormatError, PayloadWriter};
use asphalt_map::{DIRECTORY_LEN, Light};
use asphalt_mesh::MeshTile;
use asphalt_runtime::{
    FileAssetSource, IncrementalScheduler, LoaderEvent, MapPipeline, MapSettings,
    MemoryAssetSource, PipelineError, Product, RenderSink, Stage, StylePipeline, StyleSettings,
    run_to_completion,
};
use asphalt_style::TextureAtlas;

/// One textured cube at cell (1, 0), z = 0, plus a light.
fn map_bytes() -> Vec<u8> {
    let mut columns = PayloadWriter::new();
    columns.u8(0).u8(0).u16(0);
    columns.u8(1).u8(0).u16(0).u32(0);
    let mut directory = vec![0u32; DIRECTORY_LEN];
    directory[1] = 4;

    let mut dmap = PayloadWriter::new();
    dmap.u32s(&directory)
        .u32(columns.len() as u32)
        .bytes(columns.as_bytes())
        .u32(1)
        .u16s(&[5, 5, 5, 5, 5])
        .u8(0)
        .u8(0);
    let mut light = PayloadWriter::new();
    light.u32(0xFF00FF00).u16s(&[128, 128, 128, 256]).bytes(&[1, 0, 0, 0]);

    ContainerWriter::new(b"GBMP", 500)
        .chunk(b"DMAP", dmap.as_bytes())
        .chunk(b"LGHT", light.as_bytes())
        .finish()
}

/// Eight solid tiles, palette index 7 through a grey palette.
fn style_bytes() -> Vec<u8> {
    let mut ppal = vec![0u32; 16384];
    for color in 0..256usize {
        ppal[color * 64] = (color as u32) * 0x0001_0101;
    }
    let mut page = vec![0u8; 256 * 256];
    page[..256 * 128].fill(7);
    let mut palx = PayloadWriter::new();
    palx.u16s(&[0; 8]);
    let mut ppal_bytes = PayloadWriter::new();
    ppal_bytes.u32s(&ppal);
    ContainerWriter::new(b"GBST", 700)
        .chunk(b"PALX", palx.as_bytes())
        .chunk(b"PPAL", ppal_bytes.as_bytes())
        .chunk(b"TILE", &page)
        .finish()
}

#[derive(Default)]
struct Recorder {
    tiles: usize,
    triangles: usize,
    atlases: Vec<String>,
    lights: usize,
}

impl RenderSink for Recorder {
    fn mesh_tiles(&mut self, _name: &str, tiles: &[MeshTile]) {
        self.tiles += tiles.len();
        self.triangles += tiles.iter().map(MeshTile::triangle_count).sum::<usize>();
    }

    fn atlas(&mut self, name: &str, atlas: &TextureAtlas) {
        assert_eq!(atlas.pixel(1, 1), [7, 7, 7, 255]);
        self.atlases.push(name.to_string());
    }

    fn lights(&mut self, _name: &str, lights: &[Light]) {
        self.lights += lights.len();
    }
}

fn drain(scheduler: &mut IncrementalScheduler, budget: u32) -> Vec<LoaderEvent> {
    let mut events = Vec::new();
    for _ in 0..10_000 {
        let batch = scheduler.drive_steps(budget);
        let done = batch.iter().any(|e| matches!(e, LoaderEvent::AllLoaded));
        events.extend(batch);
        if done {
            return events;
        }
    }
    panic!("scheduler never drained");
}

#[test]
fn scheduler_loads_style_then_map_from_memory() {
    let mut source = MemoryAssetSource::new().with_read_chunk(50_000);
    source.insert("level.gmp", map_bytes()).insert("level.sty", style_bytes());

    let mut scheduler = IncrementalScheduler::default();
    scheduler
        .add(
            "style",
            StylePipeline::fetch(&source, "level.sty", StyleSettings::default()).unwrap(),
        )
        .add(
            "map",
            MapPipeline::fetch(&source, "level.gmp", MapSettings::default()).unwrap(),
        );
    let events = drain(&mut scheduler, 2);

    let loaded: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            LoaderEvent::Loaded { name, .. } => Some(name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(loaded, vec!["style", "map"]);
    assert!(matches!(events.last(), Some(LoaderEvent::AllLoaded)));

    let labels: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            LoaderEvent::Progress { label, percent, .. } => {
                assert!((0.0..=100.0).contains(percent));
                Some(label.as_str())
            }
            _ => None,
        })
        .collect();
    for label in [
        "Downloading level.sty",
        "Building textures",
        "Downloading level.gmp",
        "Decompressing map",
        "Creating map model",
    ] {
        assert!(labels.contains(&label), "no progress for {}", label);
    }

    let mut sink = Recorder::default();
    for e in &events {
        if let LoaderEvent::Loaded { name, product } = e {
            product.deliver(name, &mut sink);
        }
    }
    assert_eq!(sink.atlases, vec!["style"]);
    assert_eq!(sink.tiles, 1);
    assert_eq!(sink.triangles, 10);
    assert_eq!(sink.lights, 1);
}

#[test]
fn map_product_carries_lights_and_no_warnings() {
    let mut pipeline = MapPipeline::from_bytes(map_bytes(), MapSettings::default()).unwrap();
    let product = run_to_completion(&mut pipeline).unwrap();
    assert!(pipeline.is_finished());
    assert!(product.warnings.is_empty());
    assert_eq!(product.lights.len(), 1);
    assert_eq!(product.lights[0].radius, 2.0);
    assert_eq!(product.vertex_count(), 30);
    assert!(matches!(pipeline.step(), Err(PipelineError::Finished)));
}

#[test]
fn parallel_atlas_matches_stepped_atlas() {
    let stepped =
        run_to_completion(&mut StylePipeline::from_bytes(style_bytes(), StyleSettings::default()).unwrap())
            .unwrap();
    let settings = StyleSettings {
        parallel_atlas: true,
        ..StyleSettings::default()
    };
    let pool = Arc::new(rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap());
    let parallel = run_to_completion(
        &mut StylePipeline::from_bytes(style_bytes(), settings).unwrap().with_pool(pool),
    )
    .unwrap();
    assert_eq!(stepped.atlas.rgba(), parallel.atlas.rgba());
    assert_eq!(parallel.atlas.tile_count(), 16);
    assert_eq!(parallel.style.tile_count(), 16);
}

#[test]
fn missing_required_chunks_fail_the_job() {
    let no_dmap = ContainerWriter::new(b"GBMP", 500).chunk(b"ZONE", &[0; 4]).finish();
    let err = run_to_completion(&mut MapPipeline::from_bytes(no_dmap, MapSettings::default()).unwrap())
        .unwrap_err();
    assert!(matches!(err, PipelineError::MissingChunk("DMAP")));

    let no_tiles = ContainerWriter::new(b"GBST", 700).chunk(b"PALX", &[0; 4]).finish();
    let err =
        run_to_completion(&mut StylePipeline::from_bytes(no_tiles, StyleSettings::default()).unwrap())
            .unwrap_err();
    assert!(matches!(err, PipelineError::MissingChunk("TILE")));
}

#[test]
fn wrong_header_fails_before_stepping() {
    let err = MapPipeline::from_bytes(style_bytes(), MapSettings::default())
        .err()
        .unwrap();
    assert!(matches!(
        err,
        PipelineError::Format(FormatError::FormatMismatch { .. })
    ));
}

#[test]
fn failed_fetch_is_reported_and_queue_continues() {
    let mut source = MemoryAssetSource::new();
    source.insert("bad.gmp", b"GBMP\x00\x00".to_vec()).insert("good.gmp", map_bytes());
    let mut scheduler = IncrementalScheduler::default();
    scheduler
        .add("bad", MapPipeline::fetch(&source, "bad.gmp", MapSettings::default()).unwrap())
        .add("good", MapPipeline::fetch(&source, "good.gmp", MapSettings::default()).unwrap());
    let events = drain(&mut scheduler, 100);
    let failed = events
        .iter()
        .position(|e| matches!(e, LoaderEvent::Failed { name, .. } if name == "bad"))
        .unwrap();
    let loaded = events
        .iter()
        .position(|e| matches!(e, LoaderEvent::Loaded { name, product: Product::Map(_) } if name == "good"))
        .unwrap();
    assert!(failed < loaded);
}

#[test]
fn file_source_streams_from_disk() {
    let dir = std::env::temp_dir().join(format!("asphalt-runtime-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("level.gmp"), map_bytes()).unwrap();

    let source = FileAssetSource::new(&dir).with_read_chunk(4096);
    let mut pipeline = MapPipeline::fetch(&source, "level.gmp", MapSettings::default()).unwrap();
    let product = run_to_completion(&mut pipeline).unwrap();
    assert_eq!(product.triangle_count(), 10);

    assert!(source_missing(&source));
    fs::remove_dir_all(&dir).ok();
}

fn source_missing(source: &FileAssetSource) -> bool {
    matches!(
        MapPipeline::fetch(source, "nope.gmp", MapSettings::default()),
        Err(PipelineError::Fetch(_))
    )
}
