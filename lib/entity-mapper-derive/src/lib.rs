use proc_macro::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Fields, Lit, parse_macro_input};

/// Convert CamelCase to snake_case, matching `entity_mapper::to_snake_case`
fn to_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut previous: Option<char> = None;

    for c in s.chars() {
        if c.is_uppercase() && previous.is_some_and(char::is_alphabetic) {
            result.push('_');
        }
        result.extend(c.to_lowercase());
        previous = Some(c);
    }

    result.trim_matches('_').to_string()
}

/// Check if a field has a specific attribute
fn has_attr(field: &syn::Field, attr_name: &str) -> bool {
    field
        .attrs
        .iter()
        .any(|attr| attr.path().is_ident(attr_name))
}

/// Parse the `= "..."` part of a `key = "..."` nested meta
fn parse_str_value(meta: &syn::meta::ParseNestedMeta) -> syn::Result<String> {
    meta.input.parse::<syn::Token![=]>()?;
    let lit: Lit = meta.input.parse()?;
    match lit {
        Lit::Str(s) => Ok(s.value()),
        other => Err(syn::Error::new_spanned(other, "expected a string literal")),
    }
}

/// Parse #[mapped(table = "...")] attribute and return table name
fn parse_mapped_attr(input: &DeriveInput) -> syn::Result<Option<String>> {
    for attr in &input.attrs {
        if attr.path().is_ident("mapped") {
            let mut table_name = None;
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("table") {
                    table_name = Some(parse_str_value(&meta)?);
                    Ok(())
                } else {
                    Err(meta.error("unsupported mapped attribute, expected `table`"))
                }
            })?;
            return Ok(table_name);
        }
    }
    Ok(None)
}

#[derive(Default)]
struct ColumnAttr {
    name: Option<String>,
    skip: bool,
}

/// Parse #[column(name = "...")] and #[column(skip)]
fn parse_column_attr(field: &syn::Field) -> syn::Result<ColumnAttr> {
    let mut column = ColumnAttr::default();
    for attr in &field.attrs {
        if attr.path().is_ident("column") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    column.skip = true;
                    Ok(())
                } else if meta.path.is_ident("name") {
                    column.name = Some(parse_str_value(&meta)?);
                    Ok(())
                } else {
                    Err(meta.error("unsupported column attribute, expected `name` or `skip`"))
                }
            })?;
        }
    }
    Ok(column)
}

/// Parse #[id] or #[id(generator = "...")]; the inner option is the generator name
fn parse_id_attr(field: &syn::Field) -> syn::Result<Option<Option<String>>> {
    let Some(attr) = field.attrs.iter().find(|attr| attr.path().is_ident("id")) else {
        return Ok(None);
    };

    if let syn::Meta::Path(_) = attr.meta {
        return Ok(Some(None));
    }

    let mut generator = None;
    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("generator") {
            generator = Some(parse_str_value(&meta)?);
            Ok(())
        } else {
            Err(meta.error("unsupported id attribute, expected `generator`"))
        }
    })?;
    Ok(Some(generator))
}

#[derive(Clone, Copy)]
enum Relationship {
    ManyToOne,
    OneToOne { inverse: bool },
    OneToMany,
    ManyToMany,
}

impl Relationship {
    /// Relationships whose field never maps to a column
    fn has_column(self) -> bool {
        matches!(self, Relationship::ManyToOne | Relationship::OneToOne { inverse: false })
    }
}

/// Parse the relationship attribute of a field, rejecting more than one
fn parse_relationship(field: &syn::Field) -> syn::Result<Option<Relationship>> {
    let mut relationship = None;

    for attr in &field.attrs {
        let kind = if attr.path().is_ident("many_to_one") {
            attr.meta.require_path_only()?;
            Relationship::ManyToOne
        } else if attr.path().is_ident("one_to_many") {
            attr.meta.require_path_only()?;
            Relationship::OneToMany
        } else if attr.path().is_ident("many_to_many") {
            attr.meta.require_path_only()?;
            Relationship::ManyToMany
        } else if attr.path().is_ident("one_to_one") {
            let mut inverse = false;
            if !matches!(attr.meta, syn::Meta::Path(_)) {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("inverse") {
                        inverse = true;
                        Ok(())
                    } else {
                        Err(meta.error("unsupported one_to_one attribute, expected `inverse`"))
                    }
                })?;
            }
            Relationship::OneToOne { inverse }
        } else {
            continue;
        };

        if relationship.is_some() {
            return Err(syn::Error::new_spanned(
                attr,
                "a field can declare only one relationship",
            ));
        }
        relationship = Some(kind);
    }

    Ok(relationship)
}

struct MappedField<'a> {
    ident: &'a syn::Ident,
    ty: &'a syn::Type,
    name: String,
    column: Option<String>,
    generator: Option<String>,
    identifier: bool,
    relationship: Option<Relationship>,
}

impl MappedField<'_> {
    fn has_column(&self) -> bool {
        self.relationship.is_none_or(Relationship::has_column)
    }

    fn descriptor(&self) -> proc_macro2::TokenStream {
        let name = &self.name;
        let mut descriptor = quote! { ::entity_mapper::FieldDescriptor::new(#name) };

        if let Some(column) = &self.column {
            descriptor = quote! { #descriptor.column(#column) };
        }

        descriptor = match self.relationship {
            Some(Relationship::ManyToOne) => quote! { #descriptor.many_to_one() },
            Some(Relationship::OneToOne { inverse: false }) => quote! { #descriptor.one_to_one() },
            Some(Relationship::OneToOne { inverse: true }) => {
                quote! { #descriptor.one_to_one_inverse() }
            }
            Some(Relationship::OneToMany) => quote! { #descriptor.one_to_many() },
            Some(Relationship::ManyToMany) => quote! { #descriptor.many_to_many() },
            None => descriptor,
        };

        match (&self.generator, self.identifier) {
            (Some(generator), _) => quote! { #descriptor.generated_by(#generator) },
            (None, true) => quote! { #descriptor.identifier() },
            (None, false) => descriptor,
        }
    }
}

fn collect_fields(input: &DeriveInput) -> syn::Result<Vec<MappedField<'_>>> {
    let named = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "Entity can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Entity can only be derived for structs",
            ));
        }
    };

    let mut fields = Vec::new();
    for field in named {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };

        let column = parse_column_attr(field)?;
        let id = parse_id_attr(field)?;
        let relationship = parse_relationship(field)?;

        if column.skip {
            if has_attr(field, "id") || relationship.is_some() {
                return Err(syn::Error::new_spanned(
                    field,
                    "#[column(skip)] cannot be combined with #[id] or a relationship",
                ));
            }
            continue;
        }

        if id.is_some() && relationship.is_some_and(|r| !r.has_column()) {
            return Err(syn::Error::new_spanned(
                field,
                "identifier fields must map to a column",
            ));
        }

        fields.push(MappedField {
            ident,
            ty: &field.ty,
            name: ident.unraw().to_string(),
            column: column.name,
            generator: id.clone().flatten(),
            identifier: id.is_some(),
            relationship,
        });
    }

    Ok(fields)
}

/// Derive macro for the `Entity` and `Mapped` traits
///
/// Generates static mapping metadata plus field accessors keyed by field name.
///
/// ## Struct attribute
///
/// - `#[mapped(table = "...")]` - table name (default: snake_case struct name)
///
/// ## Field attributes
///
/// - `#[id]` - identifier field (repeat for composite identifiers)
/// - `#[id(generator = "name")]` - identifier filled by a named generator
/// - `#[column(name = "...")]` - explicit column name, used verbatim
/// - `#[column(skip)]` - transient field, not part of the metadata
/// - `#[many_to_one]`, `#[one_to_one]` - owning relationships, mapped to `<field>_id`
/// - `#[one_to_one(inverse)]`, `#[one_to_many]`, `#[many_to_many]` - no column
///
/// Column fields are read through `ToValue`; identifier fields are written
/// through `FromValue`. A struct with exactly one identifier field exposes it
/// as `Entity::identifier`.
///
/// ## Example
///
/// ```text
/// #[derive(Debug, Entity)]
/// #[mapped(table = "products")]
/// struct Product {
///     #[id(generator = "snowflake")]
///     pub id: Option<i64>,
///     pub name: String,
///     #[many_to_one]
///     pub category: Option<Arc<Category>>,
///     #[column(skip)]
///     pub cached_price: Option<f64>,
/// }
/// ```
#[proc_macro_derive(
    Entity,
    attributes(mapped, id, column, many_to_one, one_to_one, one_to_many, many_to_many)
)]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_entity(&input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}

fn expand_entity(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Entity cannot be derived for generic structs",
        ));
    }

    let name = &input.ident;
    let class_name = name.unraw().to_string();
    let table_name = parse_mapped_attr(input)?.unwrap_or_else(|| to_snake_case(&class_name));
    let fields = collect_fields(input)?;

    let descriptors: Vec<_> = fields.iter().map(MappedField::descriptor).collect();

    let read_arms: Vec<_> = fields
        .iter()
        .filter(|f| f.has_column())
        .map(|f| {
            let field_name = &f.name;
            let ident = f.ident;
            quote! {
                #field_name => ::std::option::Option::Some(
                    ::entity_mapper::ToValue::to_value(&self.#ident)
                ),
            }
        })
        .collect();

    let identifiers: Vec<_> = fields.iter().filter(|f| f.identifier).collect();

    let write_impl = if identifiers.is_empty() {
        quote! {}
    } else {
        let write_arms = identifiers.iter().map(|f| {
            let field_name = &f.name;
            let ident = f.ident;
            let ty = f.ty;
            quote! {
                #field_name => {
                    self.#ident = <#ty as ::entity_mapper::FromValue>::from_value(value)?;
                    ::std::result::Result::Ok(())
                }
            }
        });

        quote! {
            fn set_field_value(
                &mut self,
                field: &str,
                value: ::entity_mapper::Value,
            ) -> ::std::result::Result<(), ::entity_mapper::MapperError> {
                match field {
                    #(#write_arms)*
                    _ => ::std::result::Result::Err(::entity_mapper::MapperError::FieldNotWritable {
                        class: #class_name.to_string(),
                        field: field.to_string(),
                    }),
                }
            }
        }
    };

    let identifier_impl = match identifiers.as_slice() {
        [single] => {
            let ident = single.ident;
            quote! {
                fn identifier(&self) -> ::std::option::Option<::entity_mapper::Value> {
                    ::std::option::Option::Some(::entity_mapper::ToValue::to_value(&self.#ident))
                }
            }
        }
        _ => quote! {},
    };

    Ok(quote! {
        impl ::entity_mapper::Mapped for #name {
            fn entity_metadata() -> ::entity_mapper::EntityMetadata {
                ::entity_mapper::EntityMetadata::new(
                    ::entity_mapper::ClassId::of::<Self>(),
                    #table_name,
                    ::std::vec![#(#descriptors),*],
                )
            }
        }

        impl ::entity_mapper::Entity for #name {
            fn class_id(&self) -> ::entity_mapper::ClassId {
                ::entity_mapper::ClassId::of::<Self>()
            }

            fn describe(&self) -> ::std::option::Option<::entity_mapper::EntityMetadata> {
                ::std::option::Option::Some(<Self as ::entity_mapper::Mapped>::entity_metadata())
            }

            #[allow(clippy::match_single_binding)]
            fn field_value(&self, field: &str) -> ::std::option::Option<::entity_mapper::Value> {
                match field {
                    #(#read_arms)*
                    _ => ::std::option::Option::None,
                }
            }

            #write_impl

            #identifier_impl
        }
    })
}
