//! Resolution entry points.
//!
//! [`Resolver`] holds the configuration shared by every lookup (tick source,
//! anchor convention, default timeout) and exposes the public operations:
//!
//! | Operation | Waits for |
//! |-----------|-----------|
//! | [`resolve_path`](Resolver::resolve_path) | every segment of a path to exist |
//! | [`resolve_anchor`](Resolver::resolve_anchor) | a path to a composite, then its anchor |
//! | [`find_descendant`](Resolver::find_descendant) | a named (and optionally typed) node anywhere below a root |
//! | [`wait_for_child`](Resolver::wait_for_child) | a single named child |
//! | [`resolve_paths`](Resolver::resolve_paths) | several paths from one root, fail-fast |
//!
//! Every operation validates its arguments before subscribing to anything and
//! returns an already-rejected [`Resolution`] when they are invalid.

use core::fmt;
use core::future::Future;
use core::time::Duration;
use std::sync::Arc;

use canopy_tree::{Heartbeat, Node, NodeKind, Ticker};

use crate::anchor::{self, AnchorSpec};
use crate::bulk::bulk;
use crate::descendant::{self, DescendantQuery};
use crate::error::{ResolveError, ValidationError};
use crate::options::ResolveOptions;
use crate::path::NodePath;
use crate::resolution::Resolution;
use crate::walk::PathWalk;

/// Entry point for all resolution operations.
///
/// # Example
///
/// ```
/// use canopy_resolve::{ResolveOptions, Resolver};
/// use canopy_tree::{ManualTicker, SceneNode};
/// use futures::FutureExt;
/// use std::sync::Arc;
///
/// let resolver = Resolver::new(Arc::new(ManualTicker::new()));
/// let workspace = SceneNode::new("Folder", "Workspace");
///
/// let mut spawn = resolver.resolve_path(&workspace, "Map.Spawn", &ResolveOptions::default());
/// assert!((&mut spawn).now_or_never().is_none());
///
/// let map = SceneNode::new_child(&workspace, "Model", "Map");
/// let point = SceneNode::new_child(&map, "Part", "Spawn");
///
/// let found = spawn.now_or_never().unwrap().unwrap();
/// assert!(point.is(found.as_tree().unwrap()));
/// ```
#[derive(Clone)]
pub struct Resolver {
    ticker: Arc<dyn Ticker>,
    anchor: AnchorSpec,
    default_timeout: Option<Duration>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(Arc::new(Heartbeat::default()))
    }
}

impl Resolver {
    /// Creates a resolver polling tables on `ticker`.
    #[must_use]
    pub fn new(ticker: Arc<dyn Ticker>) -> Self {
        Self {
            ticker,
            anchor: AnchorSpec::default(),
            default_timeout: None,
        }
    }

    /// Sets the class an anchor lookup requires (default `"Model"`).
    #[must_use]
    pub fn with_anchor_kind(mut self, kind: impl Into<String>) -> Self {
        self.anchor.kind = kind.into();
        self
    }

    /// Sets the attribute holding the anchor (default `"PrimaryPart"`).
    #[must_use]
    pub fn with_anchor_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.anchor.attribute = attribute.into();
        self
    }

    /// Sets a timeout applied when a call's options do not carry one.
    #[must_use]
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// Returns the anchor convention in use.
    #[must_use]
    pub fn anchor_spec(&self) -> &AnchorSpec {
        &self.anchor
    }

    /// Returns the default timeout.
    #[must_use]
    pub fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout
    }

    fn timeout(&self, options: &ResolveOptions) -> Option<Duration> {
        options.timeout().or(self.default_timeout)
    }

    fn validate(&self, root: &Node, options: &ResolveOptions) -> Result<(), ValidationError> {
        if root.kind() == NodeKind::Value {
            return Err(ValidationError::UnsupportedRoot { found: root.kind() });
        }
        options.validate()?;
        if self
            .default_timeout
            .is_some_and(|timeout| timeout.is_zero())
        {
            return Err(ValidationError::NonPositiveTimeout);
        }
        Ok(())
    }

    fn parse(&self, path: &str, options: &ResolveOptions) -> Result<NodePath, ValidationError> {
        let parsed = NodePath::parse(path, options.separator())?;
        if parsed.has_empty_segments() {
            tracing::warn!(
                path = %path,
                separator = %options.separator(),
                "path contains empty segments; they only match nodes with an empty name"
            );
        }
        Ok(parsed)
    }

    /// Resolves with the node at `path` below `root`, waiting for missing
    /// segments to appear.
    ///
    /// Settles before returning when the whole chain already exists.
    ///
    /// # Errors
    ///
    /// The returned resolution rejects with:
    /// - [`ResolveError::Validation`] for a scalar root, a zero timeout, or
    ///   an empty separator (immediately)
    /// - [`ResolveError::Timeout`] if the path is incomplete when the
    ///   timeout elapses
    pub fn resolve_path(
        &self,
        root: impl Into<Node>,
        path: &str,
        options: &ResolveOptions,
    ) -> Resolution<Node> {
        let root = root.into();
        let parsed = match self
            .validate(&root, options)
            .and_then(|()| self.parse(path, options))
        {
            Ok(parsed) => parsed,
            Err(err) => return Resolution::rejected(err.into()),
        };

        let (resolution, completer) = Resolution::pending(path, self.timeout(options));
        tracing::debug!(
            resolution = %completer.id(),
            path = %path,
            root = %root.label(),
            "resolving path"
        );

        let settle = completer.clone();
        PathWalk::start(
            completer.id().clone(),
            root,
            parsed,
            completer.scope().clone(),
            Arc::clone(&self.ticker),
            Box::new(move |node| {
                settle.resolve(node);
            }),
        );
        resolution
    }

    /// Resolves `path` to a composite node, then resolves with the node held
    /// by its anchor attribute, waiting for the anchor to be assigned.
    ///
    /// When a timeout is configured, the anchor wait gets a fresh timeout
    /// window of its own once the path has resolved.
    ///
    /// # Errors
    ///
    /// In addition to the errors of [`resolve_path`](Self::resolve_path),
    /// rejects with [`ResolveError::TypeMismatch`] when the resolved node is
    /// not of the anchor kind.
    pub fn resolve_anchor(
        &self,
        root: impl Into<Node>,
        path: &str,
        options: &ResolveOptions,
    ) -> Resolution<Node> {
        let root = root.into();
        let parsed = match self
            .validate(&root, options)
            .and_then(|()| self.parse(path, options))
        {
            Ok(parsed) => parsed,
            Err(err) => return Resolution::rejected(err.into()),
        };

        let (resolution, completer) = Resolution::pending(path, self.timeout(options));
        tracing::debug!(
            resolution = %completer.id(),
            path = %path,
            kind = %self.anchor.kind,
            attribute = %self.anchor.attribute,
            "resolving anchor"
        );

        let spec = self.anchor.clone();
        let settle = completer.clone();
        PathWalk::start(
            completer.id().clone(),
            root,
            parsed,
            completer.scope().clone(),
            Arc::clone(&self.ticker),
            Box::new(move |node| anchor::await_anchor(node, &spec, settle)),
        );
        resolution
    }

    /// Resolves with the first node below `root` named `name` (and of class
    /// `class`, when given), waiting for one to be added if none exists.
    ///
    /// The path separator in `options` is ignored.
    ///
    /// # Errors
    ///
    /// Rejects immediately with [`ResolveError::Validation`] if `root` is
    /// not a tree node, `name` is empty, or the timeout is zero; rejects
    /// with [`ResolveError::Timeout`] when the timeout elapses first.
    pub fn find_descendant(
        &self,
        root: impl Into<Node>,
        name: &str,
        class: Option<&str>,
        options: &ResolveOptions,
    ) -> Resolution<Node> {
        let root = root.into();
        let tree = match root {
            Node::Tree(tree) => tree,
            other => {
                return Resolution::rejected(
                    ValidationError::UnsupportedRoot { found: other.kind() }.into(),
                );
            }
        };
        if name.is_empty() {
            return Resolution::rejected(ValidationError::EmptyName.into());
        }
        if let Err(err) = self.validate(&Node::Tree(Arc::clone(&tree)), options) {
            return Resolution::rejected(err.into());
        }

        let (resolution, completer) = Resolution::pending(name, self.timeout(options));
        tracing::debug!(
            resolution = %completer.id(),
            root = %tree.name(),
            name = %name,
            class = ?class,
            "finding descendant"
        );

        descendant::find(
            &tree,
            DescendantQuery {
                name: name.to_owned(),
                class: class.map(str::to_owned),
            },
            &completer,
        );
        resolution
    }

    /// Resolves with the child of `parent` named `name`, waiting for it to
    /// be added (or for an existing child to be renamed).
    ///
    /// `name` is matched verbatim; the separator is not applied.
    ///
    /// # Errors
    ///
    /// As for [`resolve_path`](Self::resolve_path), plus
    /// [`ValidationError::EmptyName`] for an empty name.
    pub fn wait_for_child(
        &self,
        parent: impl Into<Node>,
        name: &str,
        options: &ResolveOptions,
    ) -> Resolution<Node> {
        let parent = parent.into();
        if name.is_empty() {
            return Resolution::rejected(ValidationError::EmptyName.into());
        }
        if let Err(err) = self.validate(&parent, options) {
            return Resolution::rejected(err.into());
        }

        let (resolution, completer) = Resolution::pending(name, self.timeout(options));
        tracing::debug!(
            resolution = %completer.id(),
            parent = %parent.label(),
            name = %name,
            "waiting for child"
        );

        let settle = completer.clone();
        PathWalk::start(
            completer.id().clone(),
            parent,
            NodePath::from_segments([name]),
            completer.scope().clone(),
            Arc::clone(&self.ticker),
            Box::new(move |node| {
                settle.resolve(node);
            }),
        );
        resolution
    }

    /// Resolves every path in `paths` from the same root, concurrently, and
    /// collects the nodes in input order.
    ///
    /// All lookups start before this returns. The first failure (in input
    /// order) rejects with [`ResolveError::Aggregate`]; the remaining
    /// lookups are cancelled when the returned future completes or is
    /// dropped.
    pub fn resolve_paths<P>(
        &self,
        root: impl Into<Node>,
        paths: P,
        options: &ResolveOptions,
    ) -> impl Future<Output = Result<Vec<Node>, ResolveError>> + Send + 'static
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        let root = root.into();
        let resolutions: Vec<Resolution<Node>> = paths
            .into_iter()
            .map(|path| self.resolve_path(root.clone(), path.as_ref(), options))
            .collect();
        async move { bulk(resolutions).await }
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("anchor", &self.anchor)
            .field("default_timeout", &self.default_timeout)
            .finish_non_exhaustive()
    }
}
