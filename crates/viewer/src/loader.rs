use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    io,
    path::{Path, PathBuf},
    sync::mpsc::{self, Receiver, Sender},
};

use log::{debug, error};
use viewer_asset::loader::gltf::{load_glb_from_buffer, GltfLoaderError};

use crate::{config::SubtreeParams, scene::SceneSubtree};

/// Extension accepted from file pickers and drops.
pub const SUPPORTED_EXTENSION: &str = "glb";

/// Where model bytes come from.
#[derive(Clone)]
pub enum ByteSource {
    Url(String),
    File(PathBuf),
    Data { name: String, bytes: Vec<u8> },
}

impl fmt::Debug for ByteSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ByteSource::Url(url) => f.debug_tuple("Url").field(url).finish(),
            ByteSource::File(path) => f.debug_tuple("File").field(path).finish(),
            ByteSource::Data { name, bytes } => f
                .debug_struct("Data")
                .field("name", name)
                .field("len", &bytes.len())
                .finish(),
        }
    }
}

impl ByteSource {
    /// Interpret a user-typed location. Anything that is not an HTTP URL is a
    /// path, except on the web where everything is fetched.
    pub fn from_location(location: &str) -> Self {
        let location = location.trim();
        if cfg!(target_family = "wasm")
            || location.starts_with("http://")
            || location.starts_with("https://")
        {
            ByteSource::Url(location.to_string())
        } else {
            ByteSource::File(PathBuf::from(location))
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            ByteSource::Url(url) => url
                .split(['?', '#'])
                .next()
                .and_then(|path| path.rsplit('/').find(|segment| !segment.is_empty()))
                .unwrap_or(url.as_str())
                .to_string(),
            ByteSource::File(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_else(|| path.to_string_lossy().to_string()),
            ByteSource::Data { name, .. } => name.clone(),
        }
    }

    /// Reject local files that are not GLB before any read happens.
    pub fn check_supported(&self) -> Result<(), LoadError> {
        match self {
            ByteSource::Url(_) => Ok(()),
            ByteSource::File(path) => check_supported(path),
            ByteSource::Data { name, .. } => check_supported(Path::new(name)),
        }
    }
}

pub fn check_supported(path: &Path) -> Result<(), LoadError> {
    let supported = path
        .extension()
        .map(|extension| extension.eq_ignore_ascii_case(SUPPORTED_EXTENSION))
        .unwrap_or(false);
    if supported {
        Ok(())
    } else {
        Err(LoadError::UnsupportedFile(
            path.to_string_lossy().to_string(),
        ))
    }
}

#[derive(Debug)]
pub enum LoadError {
    UnsupportedFile(String),
    Io(io::Error),
    Http(String),
    Decode(GltfLoaderError),
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::UnsupportedFile(name) => {
                write!(f, "\"{}\" is not a .{} file", name, SUPPORTED_EXTENSION)
            }
            LoadError::Io(error) => write!(f, "Read failed: {}", error),
            LoadError::Http(message) => write!(f, "Download failed: {}", message),
            LoadError::Decode(error) => write!(f, "Decode failed: {}", error),
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LoadError::Io(error) => Some(error),
            LoadError::Decode(error) => Some(error),
            _ => None,
        }
    }
}

impl From<io::Error> for LoadError {
    fn from(value: io::Error) -> Self {
        LoadError::Io(value)
    }
}

impl From<GltfLoaderError> for LoadError {
    fn from(value: GltfLoaderError) -> Self {
        LoadError::Decode(value)
    }
}

#[cfg(not(target_family = "wasm"))]
impl From<ureq::Error> for LoadError {
    fn from(value: ureq::Error) -> Self {
        match value {
            ureq::Error::Status(code, response) => {
                LoadError::Http(format!("HTTP {} {}", code, response.status_text()))
            }
            other => LoadError::Http(other.to_string()),
        }
    }
}

#[derive(Debug)]
pub enum LoadEventKind {
    Progress { loaded: u64, total: Option<u64> },
    Finished(Result<SceneSubtree, LoadError>),
}

#[derive(Debug)]
pub struct LoadEvent {
    pub generation: u64,
    pub kind: LoadEventKind,
}

/// Outcome of the current load.
#[derive(Debug)]
pub struct LoadCompletion {
    pub generation: u64,
    pub display_name: String,
    pub result: Result<SceneSubtree, LoadError>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadProgress {
    pub display_name: String,
    pub loaded: u64,
    pub total: Option<u64>,
}

impl LoadProgress {
    pub fn fraction(&self) -> Option<f32> {
        self.total
            .filter(|total| *total > 0)
            .map(|total| (self.loaded as f32 / total as f32).min(1.0))
    }
}

struct PendingLoad {
    generation: u64,
    progress: LoadProgress,
}

/// Runs loads off the event loop and hands back only the latest one.
///
/// Each request bumps the generation. Events from older generations are
/// dropped when drained, so a slow load can never replace a newer one.
pub struct LoadCoordinator {
    generation: u64,
    pending: Option<PendingLoad>,
    sender: Sender<LoadEvent>,
    receiver: Receiver<LoadEvent>,
    params: SubtreeParams,
}

impl LoadCoordinator {
    pub fn new(params: SubtreeParams) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            generation: 0,
            pending: None,
            sender,
            receiver,
            params,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn progress(&self) -> Option<&LoadProgress> {
        self.pending.as_ref().map(|pending| &pending.progress)
    }

    fn begin(&mut self, display_name: String) -> u64 {
        self.generation += 1;
        if let Some(pending) = &self.pending {
            debug!(
                "Load of {} superseded by {}",
                pending.progress.display_name, display_name
            );
        }
        self.pending = Some(PendingLoad {
            generation: self.generation,
            progress: LoadProgress {
                display_name,
                loaded: 0,
                total: None,
            },
        });
        self.generation
    }

    /// Start loading. Unsupported files are rejected without touching the
    /// generation.
    pub fn request(
        &mut self,
        source: ByteSource,
        display_name: Option<String>,
    ) -> Result<u64, LoadError> {
        source.check_supported()?;
        let display_name = display_name.unwrap_or_else(|| source.display_name());
        let generation = self.begin(display_name.clone());
        debug!("Loading {:?} as generation {}", source, generation);
        LoadJob {
            generation,
            source,
            display_name,
            params: self.params,
            sender: self.sender.clone(),
        }
        .spawn();
        Ok(generation)
    }

    /// Fold one event into the pending state. Returns the completion of the
    /// current generation.
    pub fn handle_event(&mut self, event: LoadEvent) -> Option<LoadCompletion> {
        let Some(pending) = self
            .pending
            .as_mut()
            .filter(|pending| pending.generation == event.generation)
        else {
            debug!("Dropping event of stale load generation {}", event.generation);
            return None;
        };
        match event.kind {
            LoadEventKind::Progress { loaded, total } => {
                pending.progress.loaded = loaded;
                pending.progress.total = total;
                None
            }
            LoadEventKind::Finished(result) => {
                let pending = self.pending.take()?;
                if let Err(err) = &result {
                    error!("Load {} failed: {}", pending.progress.display_name, err);
                }
                Some(LoadCompletion {
                    generation: pending.generation,
                    display_name: pending.progress.display_name,
                    result,
                })
            }
        }
    }

    /// Drain queued events without blocking.
    pub fn poll(&mut self) -> Option<LoadCompletion> {
        while let Ok(event) = self.receiver.try_recv() {
            if let Some(completion) = self.handle_event(event) {
                return Some(completion);
            }
        }
        None
    }
}

struct LoadJob {
    generation: u64,
    source: ByteSource,
    display_name: String,
    params: SubtreeParams,
    sender: Sender<LoadEvent>,
}

/// Sends events for one generation. A closed channel means the view is gone.
#[derive(Clone)]
struct LoadReporter {
    generation: u64,
    sender: Sender<LoadEvent>,
}

impl LoadReporter {
    fn send(&self, kind: LoadEventKind) {
        let _ = self.sender.send(LoadEvent {
            generation: self.generation,
            kind,
        });
    }

    fn progress(&self, loaded: u64, total: Option<u64>) {
        self.send(LoadEventKind::Progress { loaded, total });
    }
}

fn decode(
    bytes: &[u8],
    display_name: String,
    params: &SubtreeParams,
    generation: u64,
) -> Result<SceneSubtree, LoadError> {
    let asset = load_glb_from_buffer(bytes)?;
    Ok(SceneSubtree::build(&asset, params, display_name, generation))
}

#[cfg(not(target_family = "wasm"))]
mod native {
    use std::{fs, io::Read, thread};

    use super::{decode, ByteSource, LoadError, LoadEventKind, LoadJob, LoadReporter};

    const CHUNK_SIZE: usize = 64 * 1024;

    fn download(url: &str, reporter: &LoadReporter) -> Result<Vec<u8>, LoadError> {
        let response = ureq::get(url).call()?;
        let total = response
            .header("Content-Length")
            .and_then(|length| length.parse::<u64>().ok());
        let mut reader = response.into_reader();
        let mut bytes = Vec::with_capacity(total.unwrap_or(0).min(1 << 28) as usize);
        let mut chunk = vec![0u8; CHUNK_SIZE];
        loop {
            let read = reader.read(&mut chunk)?;
            if read == 0 {
                break;
            }
            bytes.extend_from_slice(&chunk[..read]);
            reporter.progress(bytes.len() as u64, total);
        }
        Ok(bytes)
    }

    fn read(source: ByteSource, reporter: &LoadReporter) -> Result<Vec<u8>, LoadError> {
        let bytes = match source {
            ByteSource::Url(url) => return download(&url, reporter),
            ByteSource::File(path) => fs::read(path)?,
            ByteSource::Data { bytes, .. } => bytes,
        };
        let length = bytes.len() as u64;
        reporter.progress(length, Some(length));
        Ok(bytes)
    }

    impl LoadJob {
        pub(super) fn spawn(self) {
            let reporter = LoadReporter {
                generation: self.generation,
                sender: self.sender.clone(),
            };
            let failure_reporter = reporter.clone();
            let spawned = thread::Builder::new()
                .name(String::from("model-loader"))
                .spawn(move || {
                    let result = read(self.source, &reporter).and_then(|bytes| {
                        decode(&bytes, self.display_name, &self.params, self.generation)
                    });
                    reporter.send(LoadEventKind::Finished(result));
                });
            if let Err(err) = spawned {
                failure_reporter.send(LoadEventKind::Finished(Err(LoadError::Io(err))));
            }
        }
    }
}

#[cfg(target_family = "wasm")]
mod web {
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::{spawn_local, JsFuture};
    use web_sys::Response;

    use super::{decode, ByteSource, LoadError, LoadEventKind, LoadJob, LoadReporter};

    fn js_error(value: JsValue) -> LoadError {
        LoadError::Http(
            value
                .as_string()
                .unwrap_or_else(|| format!("{:?}", value)),
        )
    }

    async fn fetch(url: &str, reporter: &LoadReporter) -> Result<Vec<u8>, LoadError> {
        let window =
            web_sys::window().ok_or_else(|| LoadError::Http(String::from("No window")))?;
        let response: Response = JsFuture::from(window.fetch_with_str(url))
            .await
            .map_err(js_error)?
            .dyn_into()
            .map_err(js_error)?;
        if !response.ok() {
            return Err(LoadError::Http(format!(
                "HTTP {} {}",
                response.status(),
                response.status_text()
            )));
        }
        let total = response
            .headers()
            .get("Content-Length")
            .ok()
            .flatten()
            .and_then(|length| length.parse::<u64>().ok());
        let buffer = JsFuture::from(response.array_buffer().map_err(js_error)?)
            .await
            .map_err(js_error)?;
        let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
        reporter.progress(bytes.len() as u64, total.or(Some(bytes.len() as u64)));
        Ok(bytes)
    }

    impl LoadJob {
        pub(super) fn spawn(self) {
            let reporter = LoadReporter {
                generation: self.generation,
                sender: self.sender.clone(),
            };
            spawn_local(async move {
                let bytes = match self.source {
                    ByteSource::Url(url) => fetch(&url, &reporter).await,
                    ByteSource::File(path) => fetch(&path.to_string_lossy(), &reporter).await,
                    ByteSource::Data { bytes, .. } => Ok(bytes),
                };
                let result = bytes.and_then(|bytes| {
                    decode(&bytes, self.display_name, &self.params, self.generation)
                });
                reporter.send(LoadEventKind::Finished(result));
            });
        }
    }
}

#[cfg(all(test, not(target_family = "wasm")))]
mod test {
    use std::{
        path::PathBuf,
        thread,
        time::{Duration, Instant},
    };

    use viewer_asset::loader::fixture::GlbFixture;

    use crate::{config::SubtreeParams, scene::SceneSubtree};

    use super::{
        ByteSource, LoadCompletion, LoadCoordinator, LoadError, LoadEvent, LoadEventKind,
    };

    fn wait(coordinator: &mut LoadCoordinator) -> LoadCompletion {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            if let Some(completion) = coordinator.poll() {
                return completion;
            }
            assert!(Instant::now() < deadline, "load did not finish");
            thread::sleep(Duration::from_millis(5));
        }
    }

    fn fixture_source(name: &str, count: usize) -> ByteSource {
        ByteSource::Data {
            name: name.to_string(),
            bytes: GlbFixture::triangles(count).build(),
        }
    }

    fn empty_subtree(generation: u64) -> SceneSubtree {
        SceneSubtree::build(
            &Default::default(),
            &SubtreeParams::default(),
            String::from("stale.glb"),
            generation,
        )
    }

    #[test]
    fn display_names() {
        assert_eq!(
            ByteSource::Url(String::from("https://example.com/models/engine.glb?v=2"))
                .display_name(),
            "engine.glb"
        );
        assert_eq!(
            ByteSource::File(PathBuf::from("model/model.glb")).display_name(),
            "model.glb"
        );
        assert_eq!(fixture_source("drop.glb", 1).display_name(), "drop.glb");
    }

    #[test]
    fn locations_are_classified() {
        assert!(matches!(
            ByteSource::from_location("https://example.com/a.glb"),
            ByteSource::Url(_)
        ));
        assert!(matches!(
            ByteSource::from_location(" model/model.glb "),
            ByteSource::File(path) if path == PathBuf::from("model/model.glb")
        ));
    }

    #[test]
    fn unsupported_files_are_rejected_up_front() {
        let mut coordinator = LoadCoordinator::new(SubtreeParams::default());
        let result = coordinator.request(ByteSource::File(PathBuf::from("mesh.obj")), None);
        assert!(matches!(result, Err(LoadError::UnsupportedFile(_))));
        let result = coordinator.request(fixture_source("scene.gltf", 1), None);
        assert!(matches!(result, Err(LoadError::UnsupportedFile(_))));
        assert_eq!(coordinator.generation(), 0);
        assert!(!coordinator.is_loading());

        assert!(ByteSource::File(PathBuf::from("UPPER.GLB"))
            .check_supported()
            .is_ok());
        assert!(ByteSource::Url(String::from("https://example.com/model"))
            .check_supported()
            .is_ok());
    }

    #[test]
    fn stale_generations_are_dropped() {
        let mut coordinator = LoadCoordinator::new(SubtreeParams::default());
        let first = coordinator.begin(String::from("first.glb"));
        let second = coordinator.begin(String::from("second.glb"));
        assert_eq!(second, first + 1);

        let stale = coordinator.handle_event(LoadEvent {
            generation: first,
            kind: LoadEventKind::Finished(Ok(empty_subtree(first))),
        });
        assert!(stale.is_none());
        assert!(coordinator.is_loading());

        coordinator.handle_event(LoadEvent {
            generation: first,
            kind: LoadEventKind::Progress {
                loaded: 10,
                total: Some(20),
            },
        });
        assert_eq!(coordinator.progress().unwrap().loaded, 0);

        coordinator.handle_event(LoadEvent {
            generation: second,
            kind: LoadEventKind::Progress {
                loaded: 10,
                total: Some(40),
            },
        });
        let progress = coordinator.progress().unwrap();
        assert_eq!(progress.display_name, "second.glb");
        assert_eq!(progress.fraction(), Some(0.25));

        let completion = coordinator
            .handle_event(LoadEvent {
                generation: second,
                kind: LoadEventKind::Finished(Ok(empty_subtree(second))),
            })
            .unwrap();
        assert_eq!(completion.generation, second);
        assert_eq!(completion.display_name, "second.glb");
        assert!(!coordinator.is_loading());
    }

    #[test]
    fn loads_bytes_on_a_worker() {
        let mut coordinator = LoadCoordinator::new(SubtreeParams::default());
        let generation = coordinator
            .request(fixture_source("parts.glb", 3), None)
            .unwrap();
        let completion = wait(&mut coordinator);
        assert_eq!(completion.generation, generation);
        let subtree = completion.result.unwrap();
        assert_eq!(subtree.len(), 3);
        assert_eq!(subtree.display_name(), "parts.glb");
        assert_eq!(subtree.generation(), generation);
    }

    #[test]
    fn only_the_latest_request_completes() {
        let mut coordinator = LoadCoordinator::new(SubtreeParams::default());
        coordinator
            .request(fixture_source("old.glb", 5), None)
            .unwrap();
        let latest = coordinator
            .request(fixture_source("new.glb", 2), Some(String::from("Newest")))
            .unwrap();
        let completion = wait(&mut coordinator);
        assert_eq!(completion.generation, latest);
        assert_eq!(completion.display_name, "Newest");
        assert_eq!(completion.result.unwrap().len(), 2);

        thread::sleep(Duration::from_millis(50));
        assert!(coordinator.poll().is_none());
    }

    #[test]
    fn failures_are_reported() {
        let mut coordinator = LoadCoordinator::new(SubtreeParams::default());
        coordinator
            .request(
                ByteSource::Data {
                    name: String::from("broken.glb"),
                    bytes: b"not a model".to_vec(),
                },
                None,
            )
            .unwrap();
        assert!(matches!(
            wait(&mut coordinator).result,
            Err(LoadError::Decode(_))
        ));

        coordinator
            .request(
                ByteSource::File(PathBuf::from("definitely/missing/model.glb")),
                None,
            )
            .unwrap();
        assert!(matches!(wait(&mut coordinator).result, Err(LoadError::Io(_))));

        coordinator
            .request(
                ByteSource::Data {
                    name: String::from("draco.glb"),
                    bytes: GlbFixture::triangles(1)
                        .requiring("KHR_draco_mesh_compression")
                        .build(),
                },
                None,
            )
            .unwrap();
        assert!(matches!(
            wait(&mut coordinator).result,
            Err(LoadError::Decode(_))
        ));
    }

    #[test]
    fn looping_hierarchy_fails_without_killing_worker() {
        let mut coordinator = LoadCoordinator::new(SubtreeParams::default());
        coordinator
            .request(
                ByteSource::Data {
                    name: String::from("loop.glb"),
                    bytes: GlbFixture::triangles(2).with_child(1, 1).build(),
                },
                None,
            )
            .unwrap();
        let completion = wait(&mut coordinator);
        assert_eq!(completion.display_name, "loop.glb");
        assert!(matches!(completion.result, Err(LoadError::Decode(_))));

        coordinator
            .request(fixture_source("after.glb", 1), None)
            .unwrap();
        assert_eq!(wait(&mut coordinator).result.unwrap().len(), 1);
    }
}
