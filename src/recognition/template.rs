//! Template library loading and the process-wide template cache

use super::config::RecognitionConfig;
use super::error::{RecognitionError, ScanResult};
use super::matcher::resize_to_canonical;
use super::types::Template;
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Duration;
use tokio::sync::OnceCell;

/// Environment variable overriding the template directory
pub const TEMPLATES_ENV_VAR: &str = "BLUEPRINT_TEMPLATES";

const SUPPORTED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "webp"];

/// Where the template library lives: an ordered list of candidate
/// directories, the first existing one wins.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateSource {
    candidates: Vec<PathBuf>,
}

impl TemplateSource {
    /// A single fixed directory
    pub fn dir(path: impl Into<PathBuf>) -> Self {
        Self {
            candidates: vec![path.into()],
        }
    }

    pub fn candidates<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            candidates: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Usual asset layouts relative to the working directory
    pub fn default_locations() -> Self {
        Self::candidates(["public/templates", "../public/templates", "templates"])
    }

    /// `BLUEPRINT_TEMPLATES` if set, otherwise the default locations
    pub fn from_env() -> Self {
        match std::env::var(TEMPLATES_ENV_VAR) {
            Ok(dir) if !dir.trim().is_empty() => Self::dir(dir.trim()),
            _ => Self::default_locations(),
        }
    }

    pub fn candidate_paths(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// First candidate that exists as a directory.
    pub fn resolve(&self) -> ScanResult<PathBuf> {
        for dir in &self.candidates {
            let exists = dir.is_dir();
            log::debug!("Checking templates dir {:?} exists: {}", dir, exists);
            if exists {
                return Ok(dir.clone());
            }
        }
        Err(RecognitionError::TemplateDirNotFound {
            searched: self.candidates.clone(),
        })
    }
}

impl Default for TemplateSource {
    fn default() -> Self {
        Self::default_locations()
    }
}

fn is_template_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_ascii_lowercase();
                SUPPORTED_EXTENSIONS.contains(&ext.as_str())
            })
            .unwrap_or(false)
}

/// Read every image asset in the resolved directory as an intensity template
/// rescaled to `slot_size`. Files load in name order, which fixes the
/// tie-breaking order used by the matcher.
pub fn load_templates(source: &TemplateSource, slot_size: u32) -> ScanResult<Vec<Template>> {
    let dir = source.resolve()?;

    let entries = std::fs::read_dir(&dir).map_err(|source| RecognitionError::TemplateDirUnreadable {
        path: dir.clone(),
        source,
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_template_file(path))
        .collect();
    paths.sort();

    if paths.is_empty() {
        return Err(RecognitionError::NoTemplates { path: dir });
    }

    let mut templates = Vec::with_capacity(paths.len());
    for path in paths {
        let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
            log::warn!("⚠️ Skipping template with non UTF-8 name: {:?}", path);
            continue;
        };
        let image = image::open(&path).map_err(|source| RecognitionError::TemplateDecode {
            path: path.clone(),
            source,
        })?;
        let pixels = resize_to_canonical(&image.to_luma8(), slot_size);
        log::debug!(
            "Loaded template '{}' ({}x{} -> {}x{})",
            name,
            image.width(),
            image.height(),
            slot_size,
            slot_size
        );
        templates.push(Template::new(name, pixels));
    }

    if templates.is_empty() {
        return Err(RecognitionError::NoTemplates { path: dir });
    }

    Ok(templates)
}

type TemplateCell = OnceCell<Arc<[Template]>>;

/// Lazily loaded, shared, read-only template set, kept for the life of the
/// process.
///
/// Concurrent first callers wait on a single in-flight load. The load runs as
/// a detached task: a caller that gives up after `init_timeout` does not
/// cancel it, and its result still fills the cache. A failed load leaves the
/// library empty so the next call tries again.
#[derive(Debug)]
pub struct TemplateLibrary {
    source: TemplateSource,
    slot_size: u32,
    init_timeout: Duration,
    cell: Arc<TemplateCell>,
}

static SHARED_LIBRARIES: OnceLock<Mutex<HashMap<(TemplateSource, u32), Arc<TemplateLibrary>>>> =
    OnceLock::new();

impl TemplateLibrary {
    pub fn new(source: TemplateSource, config: &RecognitionConfig) -> Self {
        Self {
            source,
            slot_size: config.slot_size,
            init_timeout: config.init_timeout,
            cell: Arc::new(OnceCell::new()),
        }
    }

    /// Process-wide library for `source`; every caller with the same source
    /// and slot size shares one cache.
    pub fn shared(source: TemplateSource, config: &RecognitionConfig) -> Arc<Self> {
        let registry = SHARED_LIBRARIES.get_or_init(Default::default);
        let mut libraries = registry.lock().unwrap_or_else(PoisonError::into_inner);
        libraries
            .entry((source.clone(), config.slot_size))
            .or_insert_with(|| Arc::new(Self::new(source, config)))
            .clone()
    }

    pub fn source(&self) -> &TemplateSource {
        &self.source
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    /// Loaded templates, reading storage only on the first successful call.
    pub async fn get(&self) -> ScanResult<Arc<[Template]>> {
        let source = self.source.clone();
        let slot_size = self.slot_size;
        self.get_or_load(move || async move {
            tokio::task::spawn_blocking(move || load_templates(&source, slot_size)).await?
        })
        .await
    }

    async fn get_or_load<F, Fut>(&self, load: F) -> ScanResult<Arc<[Template]>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ScanResult<Vec<Template>>> + Send + 'static,
    {
        if let Some(templates) = self.cell.get() {
            return Ok(templates.clone());
        }

        let cell = self.cell.clone();
        let candidates = self.source.candidate_paths().to_vec();
        // Queued behind any load already in flight; only runs `load` if that one failed
        let init = tokio::spawn(async move {
            let templates = cell
                .get_or_try_init(|| async move {
                    let templates = load().await?;
                    log::info!(
                        "📚 Loaded {} template(s) from {:?}",
                        templates.len(),
                        candidates
                    );
                    Ok::<_, RecognitionError>(Arc::from(templates))
                })
                .await?;
            Ok::<_, RecognitionError>(templates.clone())
        });

        match tokio::time::timeout(self.init_timeout, init).await {
            Ok(joined) => joined?,
            Err(_) => {
                log::warn!(
                    "⏱️ Gave up waiting {:?} for templates from {:?}",
                    self.init_timeout,
                    self.source.candidate_paths()
                );
                Err(RecognitionError::TemplateTimeout {
                    duration: self.init_timeout,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn write_icon(dir: &Path, file_name: &str, size: u32, shade: u8) {
        let img = GrayImage::from_fn(size, size, |x, y| {
            Luma([shade.wrapping_add((x * 3 + y * 5) as u8)])
        });
        img.save(dir.join(file_name)).unwrap();
    }

    fn quick_config() -> RecognitionConfig {
        RecognitionConfig {
            init_timeout: Duration::from_millis(200),
            ..RecognitionConfig::default()
        }
    }

    #[test]
    fn test_load_templates_uses_file_stems_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write_icon(dir.path(), "heavy_ammo.png", 64, 10);
        write_icon(dir.path(), "frag_grenade.PNG", 96, 40);
        write_icon(dir.path(), "adrenaline_shot.bmp", 48, 90);
        std::fs::write(dir.path().join("notes.txt"), "not an image").unwrap();

        let templates = load_templates(&TemplateSource::dir(dir.path()), 64).unwrap();

        let names: Vec<&str> = templates.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["adrenaline_shot", "frag_grenade", "heavy_ammo"]);
        assert!(templates.iter().all(|t| t.pixels.dimensions() == (64, 64)));
    }

    #[test]
    fn test_missing_directory_is_asset_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_templates(&TemplateSource::dir(dir.path().join("missing")), 64).unwrap_err();
        assert!(matches!(err, RecognitionError::TemplateDirNotFound { .. }));
        assert!(err.is_asset_error());
    }

    #[test]
    fn test_directory_without_images_is_asset_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("readme.md"), "# templates").unwrap();

        let err = load_templates(&TemplateSource::dir(dir.path()), 64).unwrap_err();
        assert!(matches!(err, RecognitionError::NoTemplates { .. }));
    }

    #[test]
    fn test_corrupt_template_fails_the_load() {
        let dir = tempfile::tempdir().unwrap();
        write_icon(dir.path(), "good.png", 64, 0);
        std::fs::write(dir.path().join("broken.png"), b"definitely not a png").unwrap();

        let err = load_templates(&TemplateSource::dir(dir.path()), 64).unwrap_err();
        assert!(matches!(err, RecognitionError::TemplateDecode { .. }));
    }

    #[test]
    fn test_source_resolves_first_existing_candidate() {
        let root = tempfile::tempdir().unwrap();
        let second = root.path().join("second");
        let third = root.path().join("third");
        std::fs::create_dir(&second).unwrap();
        std::fs::create_dir(&third).unwrap();

        let source = TemplateSource::candidates([root.path().join("first"), second.clone(), third]);
        assert_eq!(source.resolve().unwrap(), second);
    }

    #[tokio::test]
    async fn test_library_caches_after_first_load() {
        let dir = tempfile::tempdir().unwrap();
        write_icon(dir.path(), "frag_grenade.png", 64, 0);
        let library = TemplateLibrary::new(TemplateSource::dir(dir.path()), &quick_config());

        assert!(!library.is_loaded());
        let first = library.get().await.unwrap();
        assert!(library.is_loaded());

        // Storage is not consulted again once loaded
        std::fs::remove_file(dir.path().join("frag_grenade.png")).unwrap();
        let second = library.get().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_calls_share_one_load() {
        let library = Arc::new(TemplateLibrary::new(
            TemplateSource::dir("unused"),
            &quick_config(),
        ));
        let loads = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let library = library.clone();
            let loads = loads.clone();
            tasks.push(tokio::spawn(async move {
                library
                    .get_or_load(|| async move {
                        loads.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok(vec![Template::new("a", GrayImage::new(64, 64))])
                    })
                    .await
            }));
        }

        for task in tasks {
            let templates = task.await.unwrap().unwrap();
            assert_eq!(templates.len(), 1);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_load_is_retried() {
        let library = TemplateLibrary::new(TemplateSource::dir("unused"), &quick_config());

        let failed = library
            .get_or_load(|| async {
                Err(RecognitionError::NoTemplates {
                    path: PathBuf::from("unused"),
                })
            })
            .await;
        assert!(failed.is_err());
        assert!(!library.is_loaded());

        let loaded = library
            .get_or_load(|| async { Ok(vec![Template::new("a", GrayImage::new(64, 64))]) })
            .await
            .unwrap();
        assert_eq!(loaded.len(), 1);
    }

    #[tokio::test]
    async fn test_slow_load_outlives_timed_out_waiters() {
        let config = RecognitionConfig {
            init_timeout: Duration::from_millis(100),
            ..RecognitionConfig::default()
        };
        let library = Arc::new(TemplateLibrary::new(TemplateSource::dir("unused"), &config));
        let started = Arc::new(AtomicUsize::new(0));

        let slow_load = |started: Arc<AtomicUsize>| {
            move || async move {
                started.fetch_add(1, Ordering::SeqCst);
                tokio::task::spawn_blocking(|| std::thread::sleep(Duration::from_millis(400)))
                    .await?;
                Ok::<_, RecognitionError>(vec![Template::new("a", GrayImage::new(64, 64))])
            }
        };

        let first = {
            let library = library.clone();
            let load = slow_load(started.clone());
            tokio::spawn(async move { library.get_or_load(load).await })
        };
        tokio::time::sleep(Duration::from_millis(40)).await;
        let second = {
            let library = library.clone();
            let load = slow_load(started.clone());
            tokio::spawn(async move { library.get_or_load(load).await })
        };

        for waiter in [first, second] {
            let err = waiter.await.unwrap().unwrap_err();
            assert!(matches!(err, RecognitionError::TemplateTimeout { .. }));
            assert!(err.is_retryable());
        }

        // The abandoned load still completes into the cache
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(library.is_loaded());
        assert_eq!(started.load(Ordering::SeqCst), 1);

        let cached = library
            .get_or_load(slow_load(started.clone()))
            .await
            .unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(started.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_shared_library_is_per_source() {
        let config = RecognitionConfig::default();
        let a1 = TemplateLibrary::shared(TemplateSource::dir("shared-a"), &config);
        let a2 = TemplateLibrary::shared(TemplateSource::dir("shared-a"), &config);
        let b = TemplateLibrary::shared(TemplateSource::dir("shared-b"), &config);

        assert!(Arc::ptr_eq(&a1, &a2));
        assert!(!Arc::ptr_eq(&a1, &b));
    }
}
