//! Project items and reference metadata

use bitflags::bitflags;
use std::path::{Path, PathBuf};

/// Item type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemKind {
    PackageReference,
    ProjectReference,
    FrameworkReference,
    Compile,
    Content,
    None,
    Using,
    Named(String),
}

impl ItemKind {
    #[must_use]
    pub fn element_name(&self) -> &str {
        match self {
            Self::PackageReference => "PackageReference",
            Self::ProjectReference => "ProjectReference",
            Self::FrameworkReference => "FrameworkReference",
            Self::Compile => "Compile",
            Self::Content => "Content",
            Self::None => "None",
            Self::Using => "Using",
            Self::Named(name) => name,
        }
    }

    /// Whether items of this kind carry [`Reference`] metadata
    #[must_use]
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            Self::PackageReference | Self::ProjectReference | Self::FrameworkReference
        )
    }
}

bitflags! {
    /// Asset visibility set used by include/exclude/private asset metadata
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Assets: u16 {
        const COMPILE = 1 << 0;
        const RUNTIME = 1 << 1;
        const CONTENT_FILES = 1 << 2;
        const BUILD = 1 << 3;
        const BUILD_MULTITARGETING = 1 << 4;
        const BUILD_TRANSITIVE = 1 << 5;
        const ANALYZERS = 1 << 6;
        const NATIVE = 1 << 7;
    }
}

const ASSET_NAMES: [(Assets, &str); 8] = [
    (Assets::COMPILE, "compile"),
    (Assets::RUNTIME, "runtime"),
    (Assets::CONTENT_FILES, "contentFiles"),
    (Assets::BUILD, "build"),
    (Assets::BUILD_MULTITARGETING, "buildMultitargeting"),
    (Assets::BUILD_TRANSITIVE, "buildTransitive"),
    (Assets::ANALYZERS, "analyzers"),
    (Assets::NATIVE, "native"),
];

impl Assets {
    /// Metadata value: `all`, `none`, or the `;`-joined flag names
    #[must_use]
    pub fn metadata_value(self) -> String {
        if self.is_all() {
            return "all".to_string();
        }
        if self.is_empty() {
            return "none".to_string();
        }
        ASSET_NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect::<Vec<_>>()
            .join(";")
    }
}

/// Extra metadata carried by reference items
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reference {
    pub version: Option<String>,
    pub generate_path_property: bool,
    pub aliases: Vec<String>,
    pub include_assets: Option<Assets>,
    pub exclude_assets: Option<Assets>,
    pub private_assets: Option<Assets>,
    /// Local project or spec file this package can be built from
    pub source: Option<PathBuf>,
}

impl Reference {
    pub(crate) fn metadata(&self) -> Vec<(&'static str, String)> {
        let mut attrs = Vec::new();
        if let Some(version) = self.version.as_deref().filter(|v| !v.trim().is_empty()) {
            attrs.push(("Version", version.to_string()));
        }
        let aliases: Vec<_> = self
            .aliases
            .iter()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .collect();
        if !aliases.is_empty() {
            attrs.push(("Aliases", aliases.join(",")));
        }
        if self.generate_path_property {
            attrs.push(("GeneratePathProperty", "true".to_string()));
        }
        for (name, assets) in [
            ("IncludeAssets", self.include_assets),
            ("ExcludeAssets", self.exclude_assets),
            ("PrivateAssets", self.private_assets),
        ] {
            if let Some(assets) = assets {
                attrs.push((name, assets.metadata_value()));
            }
        }
        attrs
    }
}

/// One item entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    kind: ItemKind,
    include: String,
    condition: Option<String>,
    label: Option<String>,
    reference: Option<Reference>,
}

impl Item {
    #[must_use]
    pub fn new(kind: ItemKind, include: impl Into<String>) -> Self {
        let reference = kind.is_reference().then(Reference::default);
        Self {
            kind,
            include: include.into(),
            condition: None,
            label: None,
            reference,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &ItemKind {
        &self.kind
    }

    #[must_use]
    pub fn include(&self) -> &str {
        &self.include
    }

    pub fn set_include(&mut self, include: impl Into<String>) -> &mut Self {
        self.include = include.into();
        self
    }

    pub fn set_condition(&mut self, condition: impl Into<String>) -> &mut Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn set_label(&mut self, label: impl Into<String>) -> &mut Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn condition(&self) -> Option<&str> {
        self.condition.as_deref()
    }

    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    #[must_use]
    pub fn reference(&self) -> Option<&Reference> {
        self.reference.as_ref()
    }

    /// Reference metadata; `None` for non-reference item kinds
    pub fn reference_mut(&mut self) -> Option<&mut Reference> {
        self.reference.as_mut()
    }

    /// Filesystem paths a local package for this item could be built from.
    ///
    /// A project reference yields its own path and the sibling `.nuspec`;
    /// a package reference yields its local source (and sibling spec) when
    /// one was given. Relative paths resolve against `base`.
    #[must_use]
    pub fn lookup_paths(&self, base: &Path) -> Vec<PathBuf> {
        let primary = match &self.kind {
            ItemKind::ProjectReference if !self.include.trim().is_empty() => {
                Some(base.join(&self.include))
            }
            ItemKind::PackageReference => self
                .reference
                .as_ref()
                .and_then(|r| r.source.as_ref())
                .map(|source| base.join(source)),
            _ => None,
        };

        let Some(primary) = primary else {
            return Vec::new();
        };
        let is_spec = primary
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("nuspec"));
        if is_spec {
            vec![primary]
        } else {
            let spec = primary.with_extension("nuspec");
            vec![primary, spec]
        }
    }

    pub(crate) fn attributes(&self) -> Vec<(&'static str, String)> {
        let mut attrs = vec![("Include", self.include.clone())];
        if let Some(condition) = &self.condition {
            attrs.push(("Condition", condition.clone()));
        }
        if let Some(label) = &self.label {
            attrs.push(("Label", label.clone()));
        }
        if let Some(reference) = &self.reference {
            attrs.extend(reference.metadata());
        }
        attrs
    }
}

/// Ordered collection of items. Duplicates are legal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemGroup {
    entries: Vec<Item>,
}

impl ItemGroup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item and return it for further editing
    pub fn add(&mut self, item: Item) -> &mut Item {
        self.entries.push(item);
        let last = self.entries.len() - 1;
        &mut self.entries[last]
    }

    /// First item of `kind`, or a new blank one appended at the end
    pub fn get_or_add(&mut self, kind: ItemKind) -> &mut Item {
        let index = match self.entries.iter().position(|i| i.kind == kind) {
            Some(index) => index,
            None => {
                self.entries.push(Item::new(kind, String::new()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[index]
    }

    pub fn of_kind<'a>(&'a self, kind: &'a ItemKind) -> impl Iterator<Item = &'a Item> + 'a {
        self.entries.iter().filter(move |i| &i.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
