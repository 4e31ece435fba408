use std::{
    fmt,
    fs::File,
    io::Read,
    path::Path,
    sync::Arc,
};

use anyhow::Context;
use parking_lot::Mutex;
use serde::Deserialize;

use crate::{
    discovery::Node,
    media::{MediaTarget, Rect},
};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MediaState {
    pub paused: bool,
    pub current_time: f64,
    pub duration: Option<f64>,
    pub volume: f64,
    pub muted: bool,
    pub playback_rate: f64,

    #[serde(skip)]
    pub play_calls: u32,

    #[serde(skip)]
    pub pause_calls: u32,
}

impl Default for MediaState {
    fn default() -> Self {
        Self {
            paused: true,
            current_time: 0.0,
            duration: None,
            volume: 1.0,
            muted: false,
            playback_rate: 1.0,
            play_calls: 0,
            pause_calls: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShadowMode {
    #[default]
    Open,
    Closed,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShadowSpec {
    #[serde(default)]
    pub mode: ShadowMode,

    #[serde(default)]
    pub children: Vec<ElementSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ElementSpec {
    pub tag: String,

    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub rect: Rect,

    #[serde(default)]
    pub media: Option<MediaState>,

    #[serde(default)]
    pub shadow: Option<ShadowSpec>,

    #[serde(default)]
    pub children: Vec<ElementSpec>,
}

impl ElementSpec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            id: None,
            rect: Rect::default(),
            media: None,
            shadow: None,
            children: Vec::new(),
        }
    }

    fn is_media_tag(&self) -> bool {
        matches!(self.tag.as_str(), "video" | "audio")
    }

    fn build(self) -> Element {
        let is_media_tag = self.is_media_tag();
        let media = match self.media {
            Some(state) => Some(state),
            None if is_media_tag => Some(MediaState::default()),
            None => None,
        };
        Element(Arc::new(ElementData {
            media: media.map(|state| Arc::new(Mutex::new(state))),
            tag: self.tag,
            id: self.id,
            rect: self.rect,
            shadow: self.shadow.map(|shadow| ShadowRoot {
                mode: shadow.mode,
                children: build_all(shadow.children),
            }),
            children: build_all(self.children),
        }))
    }
}

#[cfg(test)]
impl ElementSpec {
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn rect(mut self, rect: Rect) -> Self {
        self.rect = rect;
        self
    }

    pub fn media(mut self, state: MediaState) -> Self {
        self.media = Some(state);
        self
    }

    pub fn child(mut self, child: ElementSpec) -> Self {
        self.children.push(child);
        self
    }

    pub fn shadow(mut self, mode: ShadowMode, children: Vec<ElementSpec>) -> Self {
        self.shadow = Some(ShadowSpec { mode, children });
        self
    }
}

fn build_all(specs: Vec<ElementSpec>) -> Vec<Element> {
    specs.into_iter().map(ElementSpec::build).collect()
}

#[derive(Debug)]
struct ShadowRoot {
    mode: ShadowMode,
    children: Vec<Element>,
}

#[derive(Debug)]
struct ElementData {
    tag: String,
    id: Option<String>,
    rect: Rect,
    media: Option<Arc<Mutex<MediaState>>>,
    shadow: Option<ShadowRoot>,
    children: Vec<Element>,
}

#[derive(Debug, Clone)]
pub struct Element(Arc<ElementData>);

impl Element {
    pub fn tag(&self) -> &str {
        &self.0.tag
    }

    pub fn id(&self) -> Option<&str> {
        self.0.id.as_deref()
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.id() {
            Some(id) => write!(f, "<{} id=\"{id}\">", self.tag()),
            None => write!(f, "<{}>", self.tag()),
        }
    }
}

impl Node for Element {
    type Media = MediaElement;

    fn children(&self) -> Vec<Self> {
        self.0.children.clone()
    }

    fn shadow_children(&self) -> Option<Vec<Self>> {
        let shadow = self.0.shadow.as_ref()?;
        match shadow.mode {
            ShadowMode::Open => Some(shadow.children.clone()),
            ShadowMode::Closed => None,
        }
    }

    fn media(&self) -> Option<MediaElement> {
        let state = Arc::clone(self.0.media.as_ref()?);
        Some(MediaElement {
            element: self.clone(),
            state,
        })
    }
}

#[derive(Debug, Clone)]
pub struct MediaElement {
    element: Element,
    state: Arc<Mutex<MediaState>>,
}

impl MediaElement {
    pub fn id(&self) -> Option<&str> {
        self.element.id()
    }

    pub fn state(&self) -> MediaState {
        self.state.lock().clone()
    }
}

impl PartialEq for MediaElement {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl fmt::Display for MediaElement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.element)
    }
}

impl MediaTarget for MediaElement {
    fn is_paused(&self) -> bool {
        self.state.lock().paused
    }

    fn play(&self) {
        let mut state = self.state.lock();
        state.paused = false;
        state.play_calls += 1;
    }

    fn pause(&self) {
        let mut state = self.state.lock();
        state.paused = true;
        state.pause_calls += 1;
    }

    fn current_time(&self) -> f64 {
        self.state.lock().current_time
    }

    fn set_current_time(&self, time: f64) {
        self.state.lock().current_time = time;
    }

    fn duration(&self) -> Option<f64> {
        self.state
            .lock()
            .duration
            .filter(|duration| duration.is_finite() && *duration >= 0.0)
    }

    fn volume(&self) -> f64 {
        self.state.lock().volume
    }

    fn set_volume(&self, volume: f64) {
        self.state.lock().volume = volume;
    }

    fn is_muted(&self) -> bool {
        self.state.lock().muted
    }

    fn set_muted(&self, muted: bool) {
        self.state.lock().muted = muted;
    }

    fn playback_rate(&self) -> f64 {
        self.state.lock().playback_rate
    }

    fn set_playback_rate(&self, rate: f64) {
        self.state.lock().playback_rate = rate;
    }

    fn bounding_rect(&self) -> Rect {
        self.element.0.rect
    }
}

#[derive(Debug, Deserialize)]
struct PageSpec {
    #[serde(default)]
    elements: Vec<ElementSpec>,
}

#[derive(Debug, Clone)]
pub struct Document {
    root: Element,
}

impl Document {
    pub fn new(elements: Vec<ElementSpec>) -> Self {
        let root = ElementSpec {
            children: elements,
            ..ElementSpec::new("#document")
        };
        Self { root: root.build() }
    }

    pub fn read(file: &mut impl Read) -> anyhow::Result<Self> {
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .context("Failed to read page file")?;

        let page: PageSpec = toml::from_str(&contents).context("Failed to parse page file")?;
        Ok(Self::new(page.elements))
    }

    pub fn read_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let mut file = File::open(path).context("Failed to open page file")?;
        Self::read(&mut file)
    }

    pub fn root(&self) -> Element {
        self.root.clone()
    }

    pub fn element_by_id(&self, id: &str) -> Option<Element> {
        let mut pending = vec![self.root()];
        while let Some(element) = pending.pop() {
            if element.id() == Some(id) {
                return Some(element);
            }
            pending.extend(element.children());
            pending.extend(element.shadow_children().unwrap_or_default());
        }
        None
    }

    pub fn media_by_id(&self, id: &str) -> Option<MediaElement> {
        self.element_by_id(id)?.media()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::discovery::find_media;

    const TEST_PAGE: &str = r#"
[[elements]]
tag = "div"
id = "player"

[[elements.children]]
tag = "video"
id = "main"
rect = { left = 10.0, top = 20.0, width = 640.0, height = 360.0 }
media = { paused = false, current_time = 12.5, duration = 200.0, volume = 0.5 }

[elements.shadow]
mode = "open"

[[elements.shadow.children]]
tag = "audio"
id = "shadowed"

[[elements]]
tag = "div"
id = "widget"
media = { duration = 30.0 }
"#;

    #[test]
    fn should_parse_page() {
        // given
        let mut page_file = Cursor::new(TEST_PAGE);

        // when
        let doc = Document::read(&mut page_file).unwrap();

        // then
        let main = doc.media_by_id("main").unwrap();
        assert_eq!(
            main.state(),
            MediaState {
                paused: false,
                current_time: 12.5,
                duration: Some(200.0),
                volume: 0.5,
                ..MediaState::default()
            }
        );
        assert_eq!(
            main.bounding_rect(),
            Rect {
                left: 10.0,
                top: 20.0,
                width: 640.0,
                height: 360.0
            }
        );
        assert!(doc.media_by_id("shadowed").is_some());
        assert_eq!(doc.media_by_id("widget").unwrap().duration(), Some(30.0));
        assert!(doc.media_by_id("player").is_none());
        assert_eq!(find_media(&doc.root()).len(), 3);
    }

    #[test]
    fn should_load_demo_page() {
        // when
        let doc =
            Document::read_path(concat!(env!("CARGO_MANIFEST_DIR"), "/demos/page.toml")).unwrap();

        // then
        let ids: Vec<_> = find_media(&doc.root())
            .iter()
            .map(|media| media.id().unwrap_or_default().to_string())
            .collect();
        assert_eq!(ids, vec!["player", "ambience", "preview"]);
    }

    #[test]
    fn should_return_error_on_invalid_syntax() {
        let mut page_file = Cursor::new("[[elements]]\ntag = ");
        assert!(Document::read(&mut page_file).is_err());
    }

    #[test]
    fn should_hide_unknown_duration() {
        // given
        let doc = Document::new(vec![
            ElementSpec::new("video").id("live").media(MediaState {
                duration: Some(f64::INFINITY),
                ..MediaState::default()
            }),
            ElementSpec::new("video").id("empty"),
        ]);

        // then
        assert_eq!(doc.media_by_id("live").unwrap().duration(), None);
        assert_eq!(doc.media_by_id("empty").unwrap().duration(), None);
    }

    #[test]
    fn should_compare_handles_by_identity() {
        // given
        let doc = Document::new(vec![
            ElementSpec::new("video").id("a"),
            ElementSpec::new("video").id("b"),
        ]);

        // then
        assert_eq!(doc.media_by_id("a"), doc.media_by_id("a"));
        assert_ne!(doc.media_by_id("a"), doc.media_by_id("b"));
    }

    #[test]
    fn should_share_state_between_handles() {
        // given
        let doc = Document::new(vec![ElementSpec::new("audio").id("a")]);
        let first = doc.media_by_id("a").unwrap();
        let second = doc.media_by_id("a").unwrap();

        // when
        first.set_volume(0.3);

        // then
        assert_eq!(second.volume(), 0.3);
    }
}
