//! Test doubles: an in-memory driver over a synthetic page raster, and a
//! recording session lifecycle.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use image::{DynamicImage, Rgba, RgbaImage, imageops};
use parking_lot::Mutex;

use argus::{
	Capabilities, Driver, Element, Error, Location, Locator, MatchResult, RectangleSize, Region,
	Result, Screenshot, ScreenshotKind, SessionLifecycle, SessionStartInfo, TestResults,
};

/// Routes crate logs into the test harness output.
pub fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Shared action log plus an optional observer invoked synchronously on
/// every element action, for ordering assertions.
#[derive(Default)]
pub struct ActionLog {
	entries: Mutex<Vec<String>>,
	observer: Mutex<Option<Box<dyn Fn(&str) + Send + Sync>>>,
}

impl ActionLog {
	pub fn record(&self, entry: String) {
		if let Some(observer) = &*self.observer.lock() {
			observer(&entry);
		}
		self.entries.lock().push(entry);
	}

	pub fn entries(&self) -> Vec<String> {
		self.entries.lock().clone()
	}

	pub fn observe(&self, observer: impl Fn(&str) + Send + Sync + 'static) {
		*self.observer.lock() = Some(Box::new(observer));
	}
}

/// One synthetic DOM node.
pub struct NodeData {
	pub id: String,
	pub tag: String,
	pub text: Mutex<String>,
	pub location: Location,
	pub size: RectangleSize,
	pub attrs: HashMap<String, String>,
	pub children: Mutex<HashMap<String, Vec<Arc<NodeData>>>>,
	/// Handle returned from `click`; `None` returns the same node, which
	/// exercises the same-or-new handle contract both ways.
	pub click_result: Mutex<Option<Arc<NodeData>>>,
}

impl NodeData {
	pub fn new(id: &str, tag: &str) -> Arc<Self> {
		Arc::new(Self {
			id: id.to_string(),
			tag: tag.to_string(),
			text: Mutex::new(String::new()),
			location: Location::ZERO,
			size: RectangleSize::new(10, 10),
			attrs: HashMap::new(),
			children: Mutex::new(HashMap::new()),
			click_result: Mutex::new(None),
		})
	}

	pub fn with_geometry(id: &str, tag: &str, location: Location, size: RectangleSize) -> Arc<Self> {
		Arc::new(Self {
			id: id.to_string(),
			tag: tag.to_string(),
			text: Mutex::new(String::new()),
			location,
			size,
			attrs: HashMap::new(),
			children: Mutex::new(HashMap::new()),
			click_result: Mutex::new(None),
		})
	}

	pub fn set_text(self: &Arc<Self>, text: &str) -> Arc<Self> {
		*self.text.lock() = text.to_string();
		self.clone()
	}

	pub fn add_child(self: &Arc<Self>, locator: &Locator, child: Arc<NodeData>) -> Arc<Self> {
		self.children.lock().entry(locator.to_string()).or_default().push(child);
		self.clone()
	}
}

struct MockElement {
	node: Arc<NodeData>,
	log: Arc<ActionLog>,
}

impl MockElement {
	fn wrap(node: Arc<NodeData>, log: Arc<ActionLog>) -> Arc<dyn Element> {
		Arc::new(MockElement { node, log })
	}
}

#[async_trait]
impl Element for MockElement {
	async fn tag_name(&self) -> Result<String> {
		Ok(self.node.tag.clone())
	}

	async fn attribute(&self, name: &str) -> Result<Option<String>> {
		Ok(self.node.attrs.get(name).cloned())
	}

	async fn css_value(&self, _property: &str) -> Result<String> {
		Ok(String::new())
	}

	async fn text(&self) -> Result<String> {
		Ok(self.node.text.lock().clone())
	}

	async fn size(&self) -> Result<RectangleSize> {
		Ok(self.node.size)
	}

	async fn location(&self) -> Result<Location> {
		Ok(self.node.location)
	}

	async fn is_enabled(&self) -> Result<bool> {
		Ok(true)
	}

	async fn is_selected(&self) -> Result<bool> {
		Ok(false)
	}

	async fn is_displayed(&self) -> Result<bool> {
		Ok(true)
	}

	async fn outer_html(&self) -> Result<String> {
		Ok(format!("<{0}></{0}>", self.node.tag))
	}

	async fn inner_html(&self) -> Result<String> {
		Ok(self.node.text.lock().clone())
	}

	async fn clear(&self) -> Result<()> {
		self.node.text.lock().clear();
		Ok(())
	}

	async fn submit(&self) -> Result<()> {
		self.log.record(format!("submit:{}", self.node.id));
		Ok(())
	}

	async fn click(&self) -> Result<Arc<dyn Element>> {
		self.log.record(format!("click:{}", self.node.id));
		let next = self.node.click_result.lock().clone().unwrap_or_else(|| self.node.clone());
		Ok(MockElement::wrap(next, self.log.clone()))
	}

	async fn send_keys(&self, text: &str) -> Result<Arc<dyn Element>> {
		self.log.record(format!("keys:{}:{}", self.node.id, text));
		self.node.text.lock().push_str(text);
		Ok(MockElement::wrap(self.node.clone(), self.log.clone()))
	}

	async fn find_element(&self, locator: &Locator) -> Result<Arc<dyn Element>> {
		let children = self.node.children.lock();
		children
			.get(&locator.to_string())
			.and_then(|nodes| nodes.first().cloned())
			.map(|node| MockElement::wrap(node, self.log.clone()))
			.ok_or_else(|| Error::ElementNotFound(locator.to_string()))
	}

	async fn find_elements(&self, locator: &Locator) -> Result<Vec<Arc<dyn Element>>> {
		let children = self.node.children.lock();
		Ok(children
			.get(&locator.to_string())
			.map(|nodes| {
				nodes.iter().map(|n| MockElement::wrap(n.clone(), self.log.clone())).collect()
			})
			.unwrap_or_default())
	}
}

/// In-memory driver over a synthetic page raster.
///
/// Screenshots are viewport-sized crops of `page` at the current scroll
/// plus CSS-translate offset, optionally blown up by `dpr` to mimic a
/// high-density display.
pub struct MockDriver {
	pub page: RgbaImage,
	pub viewport: Mutex<RectangleSize>,
	pub dpr: f64,
	pub scroll: Mutex<Location>,
	pub translate: Mutex<Location>,
	pub overflow: Mutex<String>,
	pub capabilities: Capabilities,
	pub roots: Mutex<HashMap<String, Vec<Arc<NodeData>>>>,
	pub log: Arc<ActionLog>,
}

impl MockDriver {
	pub fn new(page: RgbaImage, viewport: RectangleSize) -> Arc<Self> {
		Self::with_environment(page, viewport, 1.0, Capabilities::default())
	}

	pub fn with_environment(
		page: RgbaImage,
		viewport: RectangleSize,
		dpr: f64,
		capabilities: Capabilities,
	) -> Arc<Self> {
		Arc::new(Self {
			page,
			viewport: Mutex::new(viewport),
			dpr,
			scroll: Mutex::new(Location::ZERO),
			translate: Mutex::new(Location::ZERO),
			overflow: Mutex::new(String::new()),
			capabilities,
			roots: Mutex::new(HashMap::new()),
			log: Arc::new(ActionLog::default()),
		})
	}

	/// A plain driver with a page exactly one viewport large.
	pub fn plain(viewport: RectangleSize) -> Arc<Self> {
		Self::new(
			RgbaImage::from_pixel(viewport.width, viewport.height, Rgba([200, 200, 200, 255])),
			viewport,
		)
	}

	pub fn install(self: &Arc<Self>, locator: &Locator, node: Arc<NodeData>) {
		self.roots.lock().entry(locator.to_string()).or_default().push(node);
	}

	pub fn replace(self: &Arc<Self>, locator: &Locator, nodes: Vec<Arc<NodeData>>) {
		self.roots.lock().insert(locator.to_string(), nodes);
	}

	fn page_size(&self) -> RectangleSize {
		RectangleSize::new(self.page.width(), self.page.height())
	}
}

/// A page raster where every row's color encodes its y position, so stitch
/// boundaries with duplicated or missing scan lines are detectable.
pub fn gradient_page(width: u32, height: u32) -> RgbaImage {
	RgbaImage::from_fn(width, height, |_, y| {
		Rgba([(y % 251) as u8, (y / 251) as u8, ((y * 7) % 256) as u8, 255])
	})
}

fn encode_png_base64(image: &RgbaImage) -> Result<String> {
	let mut bytes = Cursor::new(Vec::new());
	DynamicImage::ImageRgba8(image.clone())
		.write_to(&mut bytes, image::ImageOutputFormat::Png)
		.map_err(|e| Error::ImageProcessing(e.to_string()))?;
	Ok(base64::prelude::BASE64_STANDARD.encode(bytes.into_inner()))
}

fn parse_two_ints(script: &str) -> (i32, i32) {
	let args: Vec<i32> = script
		.split(['(', ')', ','])
		.filter_map(|part| part.trim().trim_end_matches("px").parse::<i32>().ok())
		.collect();
	(args.first().copied().unwrap_or(0), args.get(1).copied().unwrap_or(0))
}

#[async_trait]
impl Driver for MockDriver {
	async fn take_screenshot(&self) -> Result<String> {
		let viewport = *self.viewport.lock();
		let scroll = *self.scroll.lock();
		let translate = *self.translate.lock();
		let page = self.page_size();

		let x = (scroll.x + translate.x).clamp(0, page.width.saturating_sub(1) as i32) as u32;
		let y = (scroll.y + translate.y).clamp(0, page.height.saturating_sub(1) as i32) as u32;
		let width = viewport.width.min(page.width - x);
		let height = viewport.height.min(page.height - y);

		let crop = imageops::crop_imm(&self.page, x, y, width, height).to_image();
		let raw = if self.dpr != 1.0 {
			imageops::resize(
				&crop,
				((width as f64) * self.dpr).round() as u32,
				((height as f64) * self.dpr).round() as u32,
				imageops::FilterType::Nearest,
			)
		} else {
			crop
		};

		self.log.record("screenshot".to_string());
		encode_png_base64(&raw)
	}

	async fn title(&self) -> Result<String> {
		Ok("Mock Page".to_string())
	}

	async fn execute_script(&self, script: &str) -> Result<serde_json::Value> {
		let page = self.page_size();
		let viewport = *self.viewport.lock();

		if script.contains("scrollWidth") {
			return Ok(serde_json::json!([page.width, page.height]));
		}
		if script.contains("pageXOffset") {
			let scroll = *self.scroll.lock();
			return Ok(serde_json::json!([scroll.x, scroll.y]));
		}
		if script.starts_with("window.scrollTo(") {
			let (x, y) = parse_two_ints(script);
			let max_x = page.width.saturating_sub(viewport.width) as i32;
			let max_y = page.height.saturating_sub(viewport.height) as i32;
			*self.scroll.lock() = Location::new(x.clamp(0, max_x), y.clamp(0, max_y));
			return Ok(serde_json::Value::Null);
		}
		if script.contains("style.transform = 'translate(") {
			let (x, y) = parse_two_ints(script);
			// The script translates by the negated offset.
			*self.translate.lock() = Location::new(-x, -y);
			return Ok(serde_json::Value::Null);
		}
		if script.contains("style.transform = ''") {
			*self.translate.lock() = Location::ZERO;
			return Ok(serde_json::Value::Null);
		}
		if script.starts_with("var previous = document.documentElement.style.overflow") {
			let previous = self.overflow.lock().clone();
			*self.overflow.lock() = "hidden".to_string();
			self.log.record("hide-scrollbars".to_string());
			return Ok(serde_json::Value::String(previous));
		}
		if script.starts_with("document.documentElement.style.overflow") {
			self.log.record("restore-scrollbars".to_string());
			return Ok(serde_json::Value::Null);
		}
		if script.contains("navigator.userAgent") {
			return Ok(serde_json::Value::String("MockAgent/1.0".to_string()));
		}

		Err(Error::driver("JavascriptError", format!("unhandled script: {script}")))
	}

	async fn find_element(&self, locator: &Locator) -> Result<Arc<dyn Element>> {
		let roots = self.roots.lock();
		roots
			.get(&locator.to_string())
			.and_then(|nodes| nodes.first().cloned())
			.map(|node| MockElement::wrap(node, self.log.clone()))
			.ok_or_else(|| Error::ElementNotFound(locator.to_string()))
	}

	async fn find_elements(&self, locator: &Locator) -> Result<Vec<Arc<dyn Element>>> {
		let roots = self.roots.lock();
		Ok(roots
			.get(&locator.to_string())
			.map(|nodes| {
				nodes.iter().map(|n| MockElement::wrap(n.clone(), self.log.clone())).collect()
			})
			.unwrap_or_default())
	}

	async fn capabilities(&self) -> Result<Capabilities> {
		Ok(self.capabilities.clone())
	}

	async fn viewport_size(&self) -> Result<RectangleSize> {
		Ok(*self.viewport.lock())
	}

	async fn set_viewport_size(&self, size: RectangleSize) -> Result<()> {
		*self.viewport.lock() = size;
		Ok(())
	}
}

/// A recorded `check_window` call, screenshot flattened to the fields the
/// assertions need.
#[derive(Debug, Clone)]
pub struct RecordedCheck {
	pub tag: String,
	pub ignore_mismatch: bool,
	pub timeout: Duration,
	pub region: Option<Region>,
	pub screenshot_size: RectangleSize,
	pub screenshot_kind: ScreenshotKind,
	pub scroll_offset: Location,
	pub pixels: RgbaImage,
}

/// Recording lifecycle double with scriptable results.
pub struct MockLifecycle {
	pub opens: Mutex<Vec<(String, String, Option<RectangleSize>)>>,
	pub checks: Mutex<Vec<RecordedCheck>>,
	pub closes: Mutex<Vec<bool>>,
	pub match_results: Mutex<VecDeque<MatchResult>>,
	pub close_result: Mutex<TestResults>,
}

impl MockLifecycle {
	pub fn passing() -> Arc<Self> {
		Arc::new(Self {
			opens: Mutex::new(Vec::new()),
			checks: Mutex::new(Vec::new()),
			closes: Mutex::new(Vec::new()),
			match_results: Mutex::new(VecDeque::new()),
			close_result: Mutex::new(TestResults { is_passed: true, ..TestResults::default() }),
		})
	}

	pub fn script_match(&self, result: MatchResult) {
		self.match_results.lock().push_back(result);
	}

	pub fn script_close(&self, results: TestResults) {
		*self.close_result.lock() = results;
	}

	pub fn last_check(&self) -> RecordedCheck {
		self.checks.lock().last().cloned().expect("no check recorded")
	}
}

#[async_trait]
impl SessionLifecycle for MockLifecycle {
	async fn open(
		&self,
		app_name: &str,
		test_name: &str,
		viewport: Option<RectangleSize>,
	) -> Result<()> {
		self.opens.lock().push((app_name.to_string(), test_name.to_string(), viewport));
		Ok(())
	}

	async fn check_window(
		&self,
		tag: &str,
		ignore_mismatch: bool,
		timeout: Duration,
		region: Option<Region>,
		screenshot: Screenshot,
	) -> Result<MatchResult> {
		self.checks.lock().push(RecordedCheck {
			tag: tag.to_string(),
			ignore_mismatch,
			timeout,
			region,
			screenshot_size: screenshot.size(),
			screenshot_kind: screenshot.kind(),
			scroll_offset: screenshot.scroll_offset(),
			pixels: screenshot.image().clone(),
		});
		Ok(self
			.match_results
			.lock()
			.pop_front()
			.unwrap_or(MatchResult { as_expected: true, window_id: None }))
	}

	async fn close(&self, throw_on_mismatch: bool) -> Result<TestResults> {
		self.closes.lock().push(throw_on_mismatch);
		Ok(self.close_result.lock().clone())
	}

	fn start_info(&self) -> SessionStartInfo {
		SessionStartInfo {
			app_id_or_name: "mock-app".to_string(),
			scenario_id_or_name: "mock-test".to_string(),
		}
	}
}
