//! A name-based object model
//!
//! `TypeCatalog` knows a fixed set of class, struct and UI names and pushes
//! lightweight userdata handles for them. It backs the CLI and any host that
//! does not bring its own marshalling layer.

use crate::host::{HostContext, HostObject, ObjectModel, UiClass};
use mlua::{Lua, MetaMethod, UserData, UserDataFields, UserDataMethods, Value};
use parking_lot::RwLock;
use rustc_hash::FxHashSet;
use std::fmt;
use tracing::debug;

/// What a [`TypeHandle`] refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Struct,
}

impl TypeKind {
    fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Class => "class",
            TypeKind::Struct => "struct",
        }
    }
}

/// Opaque handle to a host type, as seen by scripts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeHandle {
    pub kind: TypeKind,
    pub name: String,
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.name)
    }
}

impl UserData for TypeHandle {
    fn add_fields<'lua, F: UserDataFields<'lua, Self>>(fields: &mut F) {
        fields.add_field_method_get("name", |_, this| Ok(this.name.clone()));
        fields.add_field_method_get("kind", |_, this| Ok(this.kind.as_str()));
    }

    fn add_methods<'lua, M: UserDataMethods<'lua, Self>>(methods: &mut M) {
        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| Ok(this.to_string()));
        methods.add_meta_method(MetaMethod::Eq, |_, this, other: mlua::AnyUserData| {
            Ok(other
                .borrow::<TypeHandle>()
                .map(|other| *this == *other)
                .unwrap_or(false))
        });
    }
}

/// Script-side view of a [`HostObject`]
#[derive(Debug, Clone)]
pub struct ObjectHandle(pub HostObject);

impl UserData for ObjectHandle {
    fn add_fields<'lua, F: UserDataFields<'lua, Self>>(fields: &mut F) {
        fields.add_field_method_get("class", |_, this| Ok(this.0.class_name().to_string()));
    }

    fn add_methods<'lua, M: UserDataMethods<'lua, Self>>(methods: &mut M) {
        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| {
            Ok(format!("object: {}", this.0.class_name()))
        });
    }
}

/// Object model backed by sets of known names
#[derive(Debug, Default)]
pub struct TypeCatalog {
    classes: RwLock<FxHashSet<String>>,
    structs: RwLock<FxHashSet<String>>,
    widgets: RwLock<FxHashSet<String>>,
}

impl TypeCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog from lists of class, struct and UI names.
    ///
    /// UI names are given without decoration (`"Menu"`, not `"Blueprint'Menu_C'"`).
    pub fn from_names<I, S>(classes: I, structs: I, widgets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let catalog = Self::new();
        for name in classes {
            catalog.add_class(name);
        }
        for name in structs {
            catalog.add_struct(name);
        }
        for name in widgets {
            catalog.add_widget(name);
        }
        catalog
    }

    /// Make `name` resolvable as a class
    pub fn add_class(&self, name: impl Into<String>) {
        self.classes.write().insert(name.into());
    }

    /// Make `name` resolvable as a struct
    pub fn add_struct(&self, name: impl Into<String>) {
        self.structs.write().insert(name.into());
    }

    /// Make `loadUI(name)` resolvable
    pub fn add_widget(&self, name: impl Into<String>) {
        let name: String = name.into();
        self.widgets
            .write()
            .insert(crate::bridge::ui_class_reference(&name));
    }

    fn push_type<'lua>(
        &self,
        lua: &'lua Lua,
        kind: TypeKind,
        name: &str,
    ) -> mlua::Result<Value<'lua>> {
        debug!("Pushing {} handle for {}", kind.as_str(), name);
        let handle = TypeHandle {
            kind,
            name: name.to_string(),
        };
        Ok(Value::UserData(lua.create_userdata(handle)?))
    }
}

impl ObjectModel for TypeCatalog {
    fn push_class<'lua>(&self, lua: &'lua Lua, name: &str) -> mlua::Result<Option<Value<'lua>>> {
        if !self.classes.read().contains(name) {
            return Ok(None);
        }
        self.push_type(lua, TypeKind::Class, name).map(Some)
    }

    fn push_struct<'lua>(&self, lua: &'lua Lua, name: &str) -> mlua::Result<Option<Value<'lua>>> {
        if !self.structs.read().contains(name) {
            return Ok(None);
        }
        self.push_type(lua, TypeKind::Struct, name).map(Some)
    }

    fn load_ui_class(&self, reference: &str) -> Option<UiClass> {
        self.widgets
            .read()
            .contains(reference)
            .then(|| UiClass::new(reference))
    }

    fn create_ui(&self, context: &HostContext, class: &UiClass) -> Option<HostObject> {
        Some(HostObject::new(class.reference(), context.clone()))
    }

    fn push_object<'lua>(&self, lua: &'lua Lua, object: HostObject) -> mlua::Result<Value<'lua>> {
        Ok(Value::UserData(lua.create_userdata(ObjectHandle(object))?))
    }
}
