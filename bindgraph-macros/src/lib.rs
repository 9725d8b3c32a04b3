//! Proc-macro half of bindgraph (SPEC_FULL.md §1.1): expands per-struct field
//! scaffolding at macro-expansion time. Everything that needs the *whole*
//! module list - collection, cycle detection, scheduling - stays ordinary
//! Rust code in the `bindgraph` crate, invoked from `ContainerBuilder::build()`.

extern crate proc_macro;

mod types;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use types::FieldInfo;

/////////////////////////////////////////////////////////////////////////////////////////

/// Generates an `Autowire` impl (SPEC_FULL.md §4.5, the `autowire` tier):
/// each `Arc<T>` field resolves via `injector.get::<T>()`, falling back to
/// `#[bindgraph(default = ...)]` when present. A field that is neither
/// `Arc<T>` nor defaulted has no way to be constructed and is a macro-time
/// error.
#[proc_macro_derive(Service, attributes(bindgraph))]
pub fn derive_service(item: TokenStream) -> TokenStream {
    let ast: syn::ItemStruct = syn::parse(item).expect("#[derive(Service)] expects a struct");
    let ident = &ast.ident;
    let fields = types::classify_fields(&ast.fields);

    let field_inits: Vec<TokenStream2> = fields.iter().map(autowire_field_init).collect();
    let field_names: Vec<&syn::Ident> = fields.iter().map(|f| &f.ident).collect();

    let gen = quote! {
        impl ::bindgraph::Autowire for #ident {
            fn autowire(
                injector: &::bindgraph::Injector,
            ) -> ::std::result::Result<Self, ::bindgraph::InjectionError> {
                #( let #field_names = #field_inits; )*
                Ok(Self {
                    #( #field_names, )*
                })
            }
        }
    };
    gen.into()
}

fn autowire_field_init(field: &FieldInfo) -> TokenStream2 {
    let base_ty = &field.base_ty;
    match (&field.default_expr, field.is_arc) {
        (Some(default), true) => quote! {
            injector.find::<#base_ty>().unwrap_or_else(|| ::std::sync::Arc::new(#default))
        },
        (Some(default), false) => quote! { #default },
        (None, true) => quote! { injector.get::<#base_ty>()? },
        (None, false) => {
            let name = &field.ident;
            panic!(
                "field `{name}` needs either an `Arc<T>` type or a \
                 #[bindgraph(default = ...)] attribute to be autowired"
            )
        }
    }
}

/////////////////////////////////////////////////////////////////////////////////////////

/// Generates a `ModuleDescriptor` impl (SPEC_FULL.md §4.3): one `FieldSpec`
/// per field, in declaration order, each carrying a `register` thunk that
/// performs the field's `insert_implicit`/`insert_implicit_value` call (plus
/// an `add_field_ref` for `#[bindgraph(interface = Trait)]` fields) against
/// whatever [`bindgraph::collector::Collector`] `ContainerBuilder::build()`
/// passes in.
///
/// A non-defaulted field's base type must itself derive both `Service` and
/// `Module` - the placeholder this macro emits for it needs to know that
/// type's own field list (see `Collector::insert_implicit`'s bound).
#[proc_macro_derive(Module, attributes(bindgraph))]
pub fn derive_module(item: TokenStream) -> TokenStream {
    let ast: syn::ItemStruct = syn::parse(item).expect("#[derive(Module)] expects a struct");
    let ident = &ast.ident;
    let fields = types::classify_fields(&ast.fields);

    let field_specs: Vec<TokenStream2> = fields.iter().map(module_field_spec).collect();

    let gen = quote! {
        impl ::bindgraph::ModuleDescriptor for #ident {
            fn module_type_info() -> ::bindgraph::TypeInfo {
                ::bindgraph::TypeInfo::of::<#ident>()
            }

            fn fields() -> ::std::vec::Vec<::bindgraph::FieldSpec> {
                ::std::vec![ #( #field_specs, )* ]
            }
        }
    };
    gen.into()
}

fn module_field_spec(field: &FieldInfo) -> TokenStream2 {
    let name_lit = field.ident.to_string();
    let base_ty = &field.base_ty;
    let is_interface = field.interface_trait.is_some();
    let register_body = module_field_register(field);

    quote! {
        ::bindgraph::FieldSpec {
            field_name: #name_lit,
            type_info: || ::bindgraph::TypeInfo::of::<#base_ty>(),
            is_interface: #is_interface,
            register: |collector: &mut ::bindgraph::Collector| {
                #register_body
            },
        }
    }
}

fn module_field_register(field: &FieldInfo) -> TokenStream2 {
    let base_ty = &field.base_ty;

    let primary = match (&field.default_expr, field.is_arc) {
        (Some(default), _) => quote! {
            collector.insert_implicit_value::<#base_ty>(
                || #default,
                <Self as ::bindgraph::ModuleDescriptor>::module_type_info(),
            );
        },
        (None, true) => quote! {
            collector.insert_implicit::<#base_ty>(
                <Self as ::bindgraph::ModuleDescriptor>::module_type_info(),
            );
        },
        (None, false) => {
            let name = &field.ident;
            panic!(
                "module field `{name}` needs either an `Arc<T>` type or a \
                 #[bindgraph(default = ...)] attribute"
            )
        }
    };

    // Per SPEC_FULL.md §4.3 point 3, `#[bindgraph(interface = Trait)]` marks
    // a module field whose *own* type exposes a sub-field literally named
    // `interface` (e.g. `Arc<dyn Trait>`) - not the module field itself.
    let Some(trait_path) = &field.interface_trait else {
        return primary;
    };

    quote! {
        #primary
        collector.add_field_ref::<dyn #trait_path>(
            ::bindgraph::Provider::field_ref::<#base_ty, dyn #trait_path>(
                "interface",
                |owner: &#base_ty| owner.interface.clone(),
            ),
        );
    }
}
