use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, LitStr, Path, Type, parse_macro_input};

/// Derive `Reflect` and `Typed`, generating the static attribute list.
///
/// # Type attributes
///
/// - `component` (default), `record`, `base`, `root`: the type's role.
/// - `name = "..."`: reported type name (defaults to the struct name).
/// - `serializable`: the record may be projected and hydrated inline.
/// - `script = "Assets/Scripts/Foo.cs"`: the type is backed by a script.
/// - `constructible`: register a `Default` constructor (implied by `record`).
/// - `properties = path::to::hook`: a `fn(TypeInfoBuilder<Self>) ->
///   TypeInfoBuilder<Self>` that registers computed properties.
///
/// # Field attributes
///
/// - `base`: the field embeds the base type. Exactly one allowed.
/// - `skip`: not reflected at all.
/// - `serialized`: non-public field persisted by the host serializer.
/// - `opaque` / `opaque = "Matrix4x4"`: reflected, but the value is not
///   described.
/// - `rename = "..."`: wire name (defaults to lowerCamelCase).
///
/// Public fields are public attributes. Fields whose name starts with `_`
/// are registered as synthesized.
///
/// ```ignore
/// #[derive(Clone, Default, Reflect)]
/// #[reflect(record, serializable)]
/// pub struct SpawnPoint {
///     pub position: Vec3,
///     pub target: Option<ObjectRef>,
///     #[reflect(serialized)]
///     weight: f32,
/// }
/// ```
#[proc_macro_derive(Reflect, attributes(reflect))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Kind {
    Component,
    Record,
    Base,
    Root,
}

struct TypeAttrs {
    kind: Kind,
    name: Option<String>,
    serializable: bool,
    script: Option<String>,
    constructible: bool,
    properties: Option<Path>,
}

#[derive(Default)]
struct FieldAttrs {
    base: bool,
    skip: bool,
    serialized: bool,
    opaque: Option<Option<String>>,
    rename: Option<String>,
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Reflect cannot be derived for generic types",
        ));
    }

    let attrs = parse_type_attrs(input)?;
    let type_name = attrs.name.clone().unwrap_or_else(|| name.to_string());

    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            name,
            "Reflect can only be derived for structs",
        ));
    };

    let mut base = None;
    let mut registrations = Vec::new();
    match &data.fields {
        Fields::Named(fields) => {
            for field in &fields.named {
                let Some(ident) = field.ident.as_ref() else {
                    continue;
                };
                let field_attrs = parse_field_attrs(field)?;
                if field_attrs.skip {
                    continue;
                }
                let ftype = &field.ty;
                if field_attrs.base {
                    if base.is_some() {
                        return Err(syn::Error::new_spanned(
                            ident,
                            "only one field may be marked #[reflect(base)]",
                        ));
                    }
                    base = Some(quote! {
                        .base::<#ftype>(|t| &t.#ident, |t| &mut t.#ident)
                    });
                    continue;
                }

                let raw = ident.to_string();
                let synthesized = raw.starts_with('_');
                let wire_name = field_attrs.rename.clone().unwrap_or_else(|| {
                    if synthesized {
                        format!("_{}", lower_camel(raw.trim_start_matches('_')))
                    } else {
                        lower_camel(&raw)
                    }
                });
                let is_pub = matches!(field.vis, syn::Visibility::Public(_));
                let flags = if synthesized {
                    quote! { ::scenewire_scene::reflect::AttrFlags::SYNTHESIZED }
                } else if is_pub {
                    quote! { ::scenewire_scene::reflect::AttrFlags::PUBLIC }
                } else if field_attrs.serialized {
                    quote! { ::scenewire_scene::reflect::AttrFlags::SERIALIZED_PRIVATE }
                } else {
                    quote! { ::scenewire_scene::reflect::AttrFlags::PRIVATE }
                };

                let registration = match &field_attrs.opaque {
                    Some(opaque_name) => {
                        let opaque_name = opaque_name
                            .clone()
                            .unwrap_or_else(|| last_segment(ftype));
                        quote! { .opaque_field(#wire_name, #flags, #opaque_name) }
                    }
                    None => quote! {
                        .field::<#ftype>(#wire_name, #flags, |t| &t.#ident, |t| &mut t.#ident)
                    },
                };
                registrations.push(registration);
            }
        }
        Fields::Unit => {}
        Fields::Unnamed(fields) => {
            return Err(syn::Error::new_spanned(
                fields,
                "Reflect requires named fields",
            ));
        }
    }

    let kind = match attrs.kind {
        Kind::Component => quote! { Component },
        Kind::Record => quote! { Record },
        Kind::Base => quote! { Base },
        Kind::Root => quote! { Root },
    };
    let serializable = attrs.serializable.then(|| quote! { .serializable() });
    let script = attrs.script.as_ref().map(|path| quote! { .script(#path) });
    let constructible =
        (attrs.constructible || attrs.kind == Kind::Record).then(|| quote! { .constructible() });
    let properties = attrs.properties.as_ref().map(|hook| quote! { .with(#hook) });

    let record_field = (attrs.kind == Kind::Record).then(|| {
        quote! {
            impl ::scenewire_scene::reflect::Field for #name {
                fn declared() -> ::scenewire_scene::reflect::DeclaredType {
                    ::scenewire_scene::reflect::DeclaredType::Record(
                        <#name as ::scenewire_scene::reflect::Typed>::type_info_static,
                    )
                }

                fn to_field_value(&self) -> ::scenewire_scene::reflect::FieldValue {
                    ::scenewire_scene::reflect::FieldValue::Record(
                        ::std::boxed::Box::new(::core::clone::Clone::clone(self)),
                    )
                }

                fn from_input(
                    input: ::scenewire_scene::reflect::FieldInput,
                ) -> ::core::result::Result<Self, ::scenewire_scene::reflect::WriteError> {
                    ::scenewire_scene::reflect::record_from_input::<Self>(input)
                }
            }
        }
    });

    Ok(quote! {
        impl ::scenewire_scene::reflect::Reflect for #name {
            fn type_info(&self) -> &'static ::scenewire_scene::reflect::TypeInfo {
                <Self as ::scenewire_scene::reflect::Typed>::type_info_static()
            }

            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::core::any::Any {
                self
            }

            fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::core::any::Any> {
                self
            }
        }

        impl ::scenewire_scene::reflect::Typed for #name {
            fn type_info_static() -> &'static ::scenewire_scene::reflect::TypeInfo {
                static INFO: ::std::sync::LazyLock<::scenewire_scene::reflect::TypeInfo> =
                    ::std::sync::LazyLock::new(|| {
                        ::scenewire_scene::reflect::TypeInfo::builder::<#name>(
                            #type_name,
                            ::scenewire_scene::reflect::TypeKind::#kind,
                        )
                        #base
                        #(#registrations)*
                        #properties
                        #serializable
                        #script
                        #constructible
                        .build()
                    });
                &INFO
            }
        }

        #record_field
    })
}

fn parse_type_attrs(input: &DeriveInput) -> syn::Result<TypeAttrs> {
    let mut attrs = TypeAttrs {
        kind: Kind::Component,
        name: None,
        serializable: false,
        script: None,
        constructible: false,
        properties: None,
    };
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("reflect")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("component") {
                attrs.kind = Kind::Component;
            } else if meta.path.is_ident("record") {
                attrs.kind = Kind::Record;
            } else if meta.path.is_ident("base") {
                attrs.kind = Kind::Base;
            } else if meta.path.is_ident("root") {
                attrs.kind = Kind::Root;
            } else if meta.path.is_ident("serializable") {
                attrs.serializable = true;
            } else if meta.path.is_ident("constructible") {
                attrs.constructible = true;
            } else if meta.path.is_ident("name") {
                attrs.name = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("script") {
                attrs.script = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("properties") {
                attrs.properties = Some(meta.value()?.parse::<Path>()?);
            } else {
                return Err(meta.error("unknown reflect type attribute"));
            }
            Ok(())
        })?;
    }
    Ok(attrs)
}

fn parse_field_attrs(field: &syn::Field) -> syn::Result<FieldAttrs> {
    let mut attrs = FieldAttrs::default();
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("reflect")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("base") {
                attrs.base = true;
            } else if meta.path.is_ident("skip") {
                attrs.skip = true;
            } else if meta.path.is_ident("serialized") {
                attrs.serialized = true;
            } else if meta.path.is_ident("opaque") {
                let name = if meta.input.peek(syn::Token![=]) {
                    Some(meta.value()?.parse::<LitStr>()?.value())
                } else {
                    None
                };
                attrs.opaque = Some(name);
            } else if meta.path.is_ident("rename") {
                attrs.rename = Some(meta.value()?.parse::<LitStr>()?.value());
            } else {
                return Err(meta.error("unknown reflect field attribute"));
            }
            Ok(())
        })?;
    }
    Ok(attrs)
}

/// `local_position` → `localPosition`.
fn lower_camel(snake: &str) -> String {
    let mut out = String::with_capacity(snake.len());
    let mut upper_next = false;
    for ch in snake.chars() {
        if ch == '_' {
            upper_next = !out.is_empty();
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Extract the last segment name from a type path (e.g. `math::Mat4` → `"Mat4"`).
fn last_segment(ty: &Type) -> String {
    match ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map(|segment| segment.ident.to_string())
            .unwrap_or_default(),
        _ => String::from("opaque"),
    }
}
