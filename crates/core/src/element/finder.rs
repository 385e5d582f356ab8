//! Lazy element-finder and collection proxies.
//!
//! A finder wraps a deferred lookup, not a handle: the locator chain is
//! re-resolved from scratch on every use, so repeated accessor calls always
//! reflect current DOM state. Every value a finder or collection hands back
//! is itself wrapped; no native locator or raw handle escapes this module.

use std::sync::Arc;

use futures_util::future::BoxFuture;

use argus_protocol::{Location, RectangleSize};
use argus_runtime::{Driver, Element, Error, Locator, Result};

use super::{InteractionSink, RemoteElement};

/// Which element an indexed accessor picks out of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pick {
	Nth(usize),
	First,
	Last,
}

/// A deferred single-element lookup: a root locator, a narrowing chain, or
/// a positional pick from a deferred collection.
#[derive(Debug, Clone)]
enum Target {
	Root(Locator),
	Child { parent: Box<Target>, locator: Locator },
	Item { collection: Box<CollectionTarget>, pick: Pick },
}

/// A deferred multi-element lookup, optionally scoped under a single-element
/// target.
#[derive(Debug, Clone)]
struct CollectionTarget {
	parent: Option<Box<Target>>,
	locator: Locator,
}

impl std::fmt::Display for Target {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Target::Root(locator) => write!(f, "{locator}"),
			Target::Child { parent, locator } => write!(f, "{parent} -> {locator}"),
			Target::Item { collection, pick } => {
				let index = match pick {
					Pick::Nth(i) => i.to_string(),
					Pick::First => "first".to_string(),
					Pick::Last => "last".to_string(),
				};
				write!(f, "{}[{index}]", collection)
			}
		}
	}
}

impl std::fmt::Display for CollectionTarget {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match &self.parent {
			Some(parent) => write!(f, "{parent} -> all({})", self.locator),
			None => write!(f, "all({})", self.locator),
		}
	}
}

fn resolve_single<'a>(
	driver: &'a Arc<dyn Driver>,
	target: &'a Target,
) -> BoxFuture<'a, Result<Arc<dyn Element>>> {
	Box::pin(async move {
		match target {
			Target::Root(locator) => driver.find_element(locator).await,
			Target::Child { parent, locator } => {
				let parent = resolve_single(driver, parent).await?;
				parent.find_element(locator).await
			}
			Target::Item { collection, pick } => {
				let handles = resolve_many(driver, collection).await?;
				let count = handles.len();
				let index = match pick {
					Pick::Nth(i) => *i,
					Pick::First => 0,
					Pick::Last => count.saturating_sub(1),
				};
				handles.into_iter().nth(index).ok_or_else(|| {
					Error::ElementNotFound(format!(
						"index {index} out of {count} matches for {collection}"
					))
				})
			}
		}
	})
}

fn resolve_many<'a>(
	driver: &'a Arc<dyn Driver>,
	target: &'a CollectionTarget,
) -> BoxFuture<'a, Result<Vec<Arc<dyn Element>>>> {
	Box::pin(async move {
		match &target.parent {
			None => driver.find_elements(&target.locator).await,
			Some(parent) => {
				let scope = resolve_single(driver, parent).await?;
				scope.find_elements(&target.locator).await
			}
		}
	})
}

/// Lazy proxy around a deferred single-element lookup.
///
/// Construction never touches the driver; resolution happens at first use
/// and on every subsequent use independently, preserving the ordering
/// guarantees of the underlying task queue.
#[derive(Clone)]
pub struct ElementFinder {
	driver: Arc<dyn Driver>,
	sink: Arc<dyn InteractionSink>,
	target: Target,
}

impl ElementFinder {
	pub(crate) fn root(
		driver: Arc<dyn Driver>,
		sink: Arc<dyn InteractionSink>,
		locator: Locator,
	) -> Self {
		Self { driver, sink, target: Target::Root(locator) }
	}

	/// Resolves to a concrete element, wrapped.
	///
	/// Each call walks the full locator chain again; nothing is cached.
	pub async fn resolve(&self) -> Result<RemoteElement> {
		tracing::trace!(target = %self.target, "resolve");
		let handle = resolve_single(&self.driver, &self.target).await?;
		Ok(RemoteElement::new(handle, self.sink.clone()))
	}

	/// Narrows the lookup to a descendant, lazily.
	pub fn find(&self, locator: Locator) -> ElementFinder {
		ElementFinder {
			driver: self.driver.clone(),
			sink: self.sink.clone(),
			target: Target::Child { parent: Box::new(self.target.clone()), locator },
		}
	}

	/// All descendants matching `locator`, as a lazy collection.
	pub fn find_all(&self, locator: Locator) -> ElementCollection {
		ElementCollection {
			driver: self.driver.clone(),
			sink: self.sink.clone(),
			target: CollectionTarget {
				parent: Some(Box::new(self.target.clone())),
				locator,
			},
		}
	}

	/// Resolves and clicks, returning a proxy around the resulting handle.
	pub async fn click(&self) -> Result<RemoteElement> {
		self.resolve().await?.click().await
	}

	/// Resolves and types, returning a proxy around the resulting handle.
	pub async fn send_keys(&self, text: &str) -> Result<RemoteElement> {
		self.resolve().await?.send_keys(text).await
	}

	pub async fn tag_name(&self) -> Result<String> {
		self.resolve().await?.tag_name().await
	}

	pub async fn attribute(&self, name: &str) -> Result<Option<String>> {
		self.resolve().await?.attribute(name).await
	}

	pub async fn css_value(&self, property: &str) -> Result<String> {
		self.resolve().await?.css_value(property).await
	}

	pub async fn text(&self) -> Result<String> {
		self.resolve().await?.text().await
	}

	pub async fn size(&self) -> Result<RectangleSize> {
		self.resolve().await?.size().await
	}

	pub async fn location(&self) -> Result<Location> {
		self.resolve().await?.location().await
	}

	pub async fn is_enabled(&self) -> Result<bool> {
		self.resolve().await?.is_enabled().await
	}

	pub async fn is_selected(&self) -> Result<bool> {
		self.resolve().await?.is_selected().await
	}

	pub async fn is_displayed(&self) -> Result<bool> {
		self.resolve().await?.is_displayed().await
	}

	pub async fn outer_html(&self) -> Result<String> {
		self.resolve().await?.outer_html().await
	}

	pub async fn inner_html(&self) -> Result<String> {
		self.resolve().await?.inner_html().await
	}

	pub async fn clear(&self) -> Result<()> {
		self.resolve().await?.clear().await
	}

	pub async fn submit(&self) -> Result<()> {
		self.resolve().await?.submit().await
	}
}

impl std::fmt::Debug for ElementFinder {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ElementFinder").field("target", &self.target.to_string()).finish()
	}
}

/// Lazy proxy around a deferred multi-element lookup.
#[derive(Clone)]
pub struct ElementCollection {
	driver: Arc<dyn Driver>,
	sink: Arc<dyn InteractionSink>,
	target: CollectionTarget,
}

impl ElementCollection {
	pub(crate) fn root(
		driver: Arc<dyn Driver>,
		sink: Arc<dyn InteractionSink>,
		locator: Locator,
	) -> Self {
		Self { driver, sink, target: CollectionTarget { parent: None, locator } }
	}

	/// Resolves to the current matches, each wrapped. Length may be zero.
	pub async fn resolve_all(&self) -> Result<Vec<RemoteElement>> {
		tracing::trace!(target = %self.target, "resolve_all");
		let handles = resolve_many(&self.driver, &self.target).await?;
		Ok(handles
			.into_iter()
			.map(|handle| RemoteElement::new(handle, self.sink.clone()))
			.collect())
	}

	/// Number of elements currently matching.
	pub async fn count(&self) -> Result<usize> {
		Ok(resolve_many(&self.driver, &self.target).await?.len())
	}

	/// Lazy reference to the `index`-th match.
	pub fn get(&self, index: usize) -> ElementFinder {
		self.pick(Pick::Nth(index))
	}

	/// Lazy reference to the first match.
	pub fn first(&self) -> ElementFinder {
		self.pick(Pick::First)
	}

	/// Lazy reference to the last match.
	pub fn last(&self) -> ElementFinder {
		self.pick(Pick::Last)
	}

	/// Converts the collection into one lazy finder per current match.
	///
	/// The collection owns this conversion; positions are fixed at call
	/// time but each returned finder still re-resolves on use.
	pub async fn as_finders(&self) -> Result<Vec<ElementFinder>> {
		let count = self.count().await?;
		Ok((0..count).map(|i| self.get(i)).collect())
	}

	fn pick(&self, pick: Pick) -> ElementFinder {
		ElementFinder {
			driver: self.driver.clone(),
			sink: self.sink.clone(),
			target: Target::Item { collection: Box::new(self.target.clone()), pick },
		}
	}
}

impl std::fmt::Debug for ElementCollection {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ElementCollection").field("target", &self.target.to_string()).finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn target_display_describes_the_chain() {
		let chain = Target::Child {
			parent: Box::new(Target::Root(Locator::css("#nav"))),
			locator: Locator::css("a.item"),
		};
		assert_eq!(chain.to_string(), "css=#nav -> css=a.item");

		let item = Target::Item {
			collection: Box::new(CollectionTarget {
				parent: Some(Box::new(Target::Root(Locator::css("ul")))),
				locator: Locator::css("li"),
			}),
			pick: Pick::Nth(2),
		};
		assert_eq!(item.to_string(), "css=ul -> all(css=li)[2]");
	}
}
