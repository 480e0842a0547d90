//! Project descriptor: root attributes, one property group, one item group

use crate::builder::{write_contents, DescriptorBuilder};
use crate::item::{Item, ItemGroup, ItemKind};
use crate::property::{Property, PropertyGroup, PropertyKey};
use crate::xml::XmlWriter;
use async_trait::async_trait;
use sandbuild_config::constants::DEFAULT_PROJECT_SDK;
use sandbuild_errors::{DescriptorError, Error};
use sandbuild_workspace::Subdirectory;
use std::fmt;
use std::path::{Path, PathBuf};

/// Nullable reference type checking mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nullable {
    Enable,
    Disable,
    Warnings,
    Annotations,
}

impl Nullable {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enable => "enable",
            Self::Disable => "disable",
            Self::Warnings => "warnings",
            Self::Annotations => "annotations",
        }
    }
}

/// Project output kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputType {
    Exe,
    Library,
    WinExe,
}

impl OutputType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exe => "Exe",
            Self::Library => "Library",
            Self::WinExe => "WinExe",
        }
    }
}

/// A project file under a workspace directory
#[derive(Debug, Clone)]
pub struct ProjectDescriptor {
    dir: Subdirectory,
    file_name: String,
    attributes: Vec<(String, String)>,
    properties: PropertyGroup,
    items: ItemGroup,
}

impl ProjectDescriptor {
    /// Describe `file_name` under `dir`. The SDK attribute is seeded with the
    /// default project SDK.
    ///
    /// # Errors
    ///
    /// Returns `DescriptorError::InvalidArgument` for a blank file name.
    pub fn new(dir: &Subdirectory, file_name: impl Into<String>) -> Result<Self, Error> {
        let file_name = file_name.into();
        if file_name.trim().is_empty() {
            return Err(DescriptorError::InvalidArgument {
                name: "file_name".to_string(),
                message: "must not be blank".to_string(),
            }
            .into());
        }
        Ok(Self {
            dir: dir.clone(),
            file_name,
            attributes: vec![("Sdk".to_string(), DEFAULT_PROJECT_SDK.to_string())],
            properties: PropertyGroup::new(),
            items: ItemGroup::new(),
        })
    }

    /// Set or replace a root attribute
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.attributes.push((name, value)),
        }
        self
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn properties(&self) -> &PropertyGroup {
        &self.properties
    }

    #[must_use]
    pub fn items(&self) -> &ItemGroup {
        &self.items
    }

    /// The single live property for `key`
    pub fn get_or_add_property(&mut self, key: PropertyKey) -> &mut Property {
        self.properties.get_or_add(key)
    }

    /// The first item of `kind`, created blank if none exists
    pub fn get_or_add_item(&mut self, kind: ItemKind) -> &mut Item {
        self.items.get_or_add(kind)
    }

    /// Append an item unconditionally
    pub fn add_item(&mut self, item: Item) -> &mut Item {
        self.items.add(item)
    }

    pub fn set_target_framework(&mut self, tfm: impl Into<String>) -> &mut Self {
        self.properties
            .get_or_add(PropertyKey::TargetFramework)
            .set_value(tfm);
        self
    }

    pub fn set_output_type(&mut self, output_type: OutputType) -> &mut Self {
        self.properties
            .get_or_add(PropertyKey::OutputType)
            .set_value(output_type.as_str());
        self
    }

    pub fn set_nullable(&mut self, nullable: Nullable) -> &mut Self {
        self.properties
            .get_or_add(PropertyKey::Nullable)
            .set_value(nullable.as_str());
        self
    }

    pub fn set_runtime_identifier(&mut self, rid: impl Into<String>) -> &mut Self {
        self.properties
            .get_or_add(PropertyKey::RuntimeIdentifier)
            .set_value(rid);
        self
    }

    pub fn set_lang_version(&mut self, version: impl Into<String>) -> &mut Self {
        self.properties
            .get_or_add(PropertyKey::LangVersion)
            .set_value(version);
        self
    }

    pub fn add_package_reference(
        &mut self,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> &mut Item {
        let item = self.items.add(Item::new(ItemKind::PackageReference, name));
        if let Some(reference) = item.reference_mut() {
            reference.version = Some(version.into());
        }
        item
    }

    pub fn add_project_reference(&mut self, path: impl Into<String>) -> &mut Item {
        self.items.add(Item::new(ItemKind::ProjectReference, path))
    }

    pub fn add_framework_reference(&mut self, name: impl Into<String>) -> &mut Item {
        self.items.add(Item::new(ItemKind::FrameworkReference, name))
    }

    pub fn add_compile(&mut self, include: impl Into<String>) -> &mut Item {
        self.items.add(Item::new(ItemKind::Compile, include))
    }

    /// Every local source path the reference items point at, resolved
    /// against the descriptor's directory
    #[must_use]
    pub fn reference_lookup_paths(&self) -> Vec<PathBuf> {
        self.items
            .iter()
            .flat_map(|item| item.lookup_paths(self.dir.path()))
            .collect()
    }

    /// Serialize to the project markup.
    ///
    /// Empty groups are left out entirely, as are properties whose resolved
    /// value is blank and items with a blank include.
    #[must_use]
    pub fn to_xml(&self) -> String {
        let mut w = XmlWriter::new();
        let root_attrs: Vec<(&str, &str)> = self
            .attributes
            .iter()
            .filter(|(_, v)| !v.trim().is_empty())
            .map(|(n, v)| (n.as_str(), v.as_str()))
            .collect();
        w.open("Project", &root_attrs);

        let properties: Vec<(&Property, String)> = self
            .properties
            .iter()
            .map(|p| (p, p.resolved_value()))
            .filter(|(_, value)| !value.is_empty())
            .collect();
        if !properties.is_empty() {
            w.open("PropertyGroup", &[]);
            for (property, value) in properties {
                let mut attrs = Vec::new();
                if let Some(condition) = property.condition() {
                    attrs.push(("Condition", condition));
                }
                if let Some(label) = property.label() {
                    attrs.push(("Label", label));
                }
                w.text(property.key().element_name(), &attrs, &value);
            }
            w.close("PropertyGroup");
        }

        let items: Vec<&Item> = self
            .items
            .iter()
            .filter(|i| !i.include().trim().is_empty())
            .collect();
        if !items.is_empty() {
            w.open("ItemGroup", &[]);
            for item in items {
                let owned = item.attributes();
                let attrs: Vec<(&str, &str)> =
                    owned.iter().map(|(n, v)| (*n, v.as_str())).collect();
                w.empty(item.kind().element_name(), &attrs);
            }
            w.close("ItemGroup");
        }

        w.close("Project");
        w.finish()
    }
}

impl fmt::Display for ProjectDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml())
    }
}

#[async_trait]
impl DescriptorBuilder for ProjectDescriptor {
    fn dir(&self) -> &Subdirectory {
        &self.dir
    }

    fn relative_path(&self) -> &Path {
        Path::new(&self.file_name)
    }

    async fn create(&self) -> Result<(), Error> {
        write_contents(&self.dir, &self.file_name, self.to_xml().as_bytes()).await
    }

    fn as_project(&self) -> Option<&ProjectDescriptor> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Assets;
    use sandbuild_workspace::Workspace;

    fn project() -> (Workspace, ProjectDescriptor) {
        let ws = Workspace::new();
        let project = ProjectDescriptor::new(ws.root(), "App.csproj").unwrap();
        (ws, project)
    }

    #[test]
    fn test_blank_file_name_is_rejected() {
        let ws = Workspace::new();
        let err = ProjectDescriptor::new(ws.root(), " ").unwrap_err();
        assert!(err.is_precondition());
    }

    #[test]
    fn test_empty_groups_are_omitted() {
        let (_ws, mut project) = project();
        project.get_or_add_property(PropertyKey::NoWarn).add_value("  ");
        project.get_or_add_item(ItemKind::Compile);
        assert_eq!(
            project.to_xml(),
            "<Project Sdk=\"Microsoft.NET.Sdk\">\n</Project>\n"
        );
    }

    #[test]
    fn test_full_serialization() {
        let (_ws, mut project) = project();
        project
            .set_output_type(OutputType::Exe)
            .set_target_framework("net8.0")
            .set_nullable(Nullable::Enable);
        project
            .get_or_add_property(PropertyKey::NoWarn)
            .add_value("CS1591")
            .add_value("CA1000")
            .set_condition("'$(Configuration)' == 'Debug'");
        let pkg = project.add_package_reference("Newtonsoft.Json", "13.0.3");
        pkg.reference_mut().unwrap().private_assets = Some(Assets::all());
        project.add_compile("Program.cs");

        assert_eq!(
            project.to_xml(),
            "<Project Sdk=\"Microsoft.NET.Sdk\">\n\
             \x20 <PropertyGroup>\n\
             \x20   <OutputType>Exe</OutputType>\n\
             \x20   <TargetFramework>net8.0</TargetFramework>\n\
             \x20   <Nullable>enable</Nullable>\n\
             \x20   <NoWarn Condition=\"'$(Configuration)' == 'Debug'\">CS1591;CA1000</NoWarn>\n\
             \x20 </PropertyGroup>\n\
             \x20 <ItemGroup>\n\
             \x20   <PackageReference Include=\"Newtonsoft.Json\" Version=\"13.0.3\" PrivateAssets=\"all\" />\n\
             \x20   <Compile Include=\"Program.cs\" />\n\
             \x20 </ItemGroup>\n\
             </Project>\n"
        );
    }

    #[test]
    fn test_typed_setters_do_not_duplicate() {
        let (_ws, mut project) = project();
        project.set_target_framework("net6.0");
        project.set_target_framework("net8.0");
        project.set_runtime_identifier("linux-x64");
        assert_eq!(project.properties().len(), 2);
        assert_eq!(
            project
                .properties()
                .get(&PropertyKey::TargetFramework)
                .unwrap()
                .resolved_value(),
            "net8.0"
        );
    }

    #[test]
    fn test_attributes_replace_and_skip_blank() {
        let (_ws, mut project) = project();
        project.set_attribute("Sdk", "Microsoft.NET.Sdk.Web");
        project.set_attribute("ToolsVersion", "");
        assert_eq!(project.attribute("Sdk"), Some("Microsoft.NET.Sdk.Web"));
        assert!(project
            .to_xml()
            .starts_with("<Project Sdk=\"Microsoft.NET.Sdk.Web\">"));
    }

    #[test]
    fn test_lookup_paths_resolve_against_descriptor_dir() {
        let (ws, mut project) = project();
        project.add_project_reference("../Lib/Lib.csproj");
        project.add_package_reference("Plain", "1.0.0");
        let paths = project.reference_lookup_paths();
        assert_eq!(
            paths,
            vec![
                ws.path().join("../Lib/Lib.csproj"),
                ws.path().join("../Lib/Lib.nuspec"),
            ]
        );
    }

    #[test]
    fn test_path_is_known_before_create() {
        let (ws, project) = project();
        assert_eq!(project.path(), ws.path().join("App.csproj"));
        assert!(!project.path().exists());
    }
}
