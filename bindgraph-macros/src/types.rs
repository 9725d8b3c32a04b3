use quote::ToTokens;

/////////////////////////////////////////////////////////////////////////////////////////
// Field classification for `#[derive(Service)]`/`#[derive(Module)]`
// (SPEC_FULL.md §4.3/§4.5). A field's static type tells us whether it names
// a dependency (`Arc<T>`) or carries a value directly; `#[bindgraph(...)]`
// attributes carry everything a field's type alone can't say: the default
// expression, and whether the field's own `interface` sub-field should be
// exposed as a separate service (SPEC_FULL.md §4.3 point 3).
/////////////////////////////////////////////////////////////////////////////////////////

pub(crate) struct FieldInfo {
    pub ident: syn::Ident,
    pub is_arc: bool,
    /// `T` for an `Arc<T>` field, else the field's own declared type.
    pub base_ty: syn::Type,
    pub default_expr: Option<syn::Expr>,
    pub interface_trait: Option<syn::Path>,
}

pub(crate) fn classify_fields(fields: &syn::Fields) -> Vec<FieldInfo> {
    let syn::Fields::Named(named) = fields else {
        panic!("bindgraph derives only support structs with named fields");
    };

    named
        .named
        .iter()
        .map(|field| {
            let ident = field
                .ident
                .clone()
                .expect("named field always has an identifier");
            let is_arc = is_smart_ptr(&field.ty);
            let base_ty = if is_arc {
                strip_smart_ptr(&field.ty)
            } else {
                field.ty.clone()
            };
            let (default_expr, interface_trait) = parse_field_attrs(field);
            FieldInfo {
                ident,
                is_arc,
                base_ty,
                default_expr,
                interface_trait,
            }
        })
        .collect()
}

fn parse_field_attrs(field: &syn::Field) -> (Option<syn::Expr>, Option<syn::Path>) {
    let mut default_expr = None;
    let mut interface_trait = None;

    for attr in &field.attrs {
        if !attr.path().is_ident("bindgraph") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("default") {
                let expr: syn::Expr = meta.value()?.parse()?;
                default_expr = Some(expr);
                Ok(())
            } else if meta.path.is_ident("interface") {
                let path: syn::Path = meta.value()?.parse()?;
                interface_trait = Some(path);
                Ok(())
            } else {
                Err(meta.error("expected `default = <expr>` or `interface = <Trait>`"))
            }
        })
        .unwrap_or_else(|e| panic!("invalid #[bindgraph(...)] attribute: {e}"));
    }

    (default_expr, interface_trait)
}

/////////////////////////////////////////////////////////////////////////////////////////

pub(crate) fn is_smart_ptr(typ: &syn::Type) -> bool {
    let syn::Type::Path(typepath) = typ else {
        return false;
    };

    if typepath.qself.is_some() || typepath.path.segments.len() != 1 {
        return false;
    }

    &typepath.path.segments[0].ident == "Arc"
}

pub(crate) fn strip_smart_ptr(typ: &syn::Type) -> syn::Type {
    match typ {
        syn::Type::Path(typepath) if typepath.qself.is_none() => {
            match typepath.path.segments.first() {
                Some(seg) if &seg.ident == "Arc" => match seg.arguments {
                    syn::PathArguments::AngleBracketed(ref args) => {
                        syn::parse2(args.args.to_token_stream()).unwrap()
                    }
                    _ => typ.clone(),
                },
                _ => typ.clone(),
            }
        }
        _ => typ.clone(),
    }
}

/////////////////////////////////////////////////////////////////////////////////////////
