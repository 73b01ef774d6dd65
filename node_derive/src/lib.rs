#![recursion_limit = "128"]
extern crate proc_macro;

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

enum FieldType {
    Input,
    Output,
    State,
}

/// Implements `tablet_filters::node::Node` for a structure.
///
/// Fields typed `NodeReceiver<T>` are inputs, fields typed `NodeSender<T>`
/// are outputs and everything else is node state. The generated `call`
/// receives one value from every input, hands them to `self.run(..)` in
/// declaration order and broadcasts the result to every output. A `new`
/// constructor taking the state fields in declaration order is generated
/// as well; inputs and outputs start unconnected.
///
/// Tag the structure with `#[pass_by_ref]` to have `run` take its inputs
/// by reference.
#[proc_macro_derive(Node, attributes(pass_by_ref))]
pub fn node_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) =
        input.generics.split_for_impl();
    let pass_by_ref = input
        .attrs
        .iter()
        .any(|attr| attr.path.is_ident("pass_by_ref"));

    let mut recv_fields = vec![];
    let mut send_fields = vec![];
    let mut state_fields = vec![];
    match &input.data {
        syn::Data::Struct(data_struct) => match &data_struct.fields {
            syn::Fields::Named(fields) => {
                for field in &fields.named {
                    match parse_type(field) {
                        FieldType::Input => recv_fields.push(field),
                        FieldType::Output => send_fields.push(field),
                        FieldType::State => state_fields.push(field),
                    }
                }
            }
            _ => panic!("Node derive needs named fields."),
        },
        _ => panic!("Node derive only supports structures."),
    }

    let recv_idents: Vec<&syn::Ident> = recv_fields
        .iter()
        .filter_map(|x| x.ident.as_ref())
        .collect();
    let send_idents: Vec<&syn::Ident> = send_fields
        .iter()
        .filter_map(|x| x.ident.as_ref())
        .collect();
    let state_idents: Vec<&syn::Ident> = state_fields
        .iter()
        .filter_map(|x| x.ident.as_ref())
        .collect();
    let state_types: Vec<&syn::Type> =
        state_fields.iter().map(|x| &x.ty).collect();

    let recv_idents2 = recv_idents.clone();
    let recv_idents3 = recv_idents.clone();
    let recv_idents4 = recv_idents.clone();
    let send_idents2 = send_idents.clone();
    let send_idents3 = send_idents.clone();
    let state_idents2 = state_idents.clone();

    let run_args = if pass_by_ref {
        quote! { #(&#recv_idents3),* }
    } else {
        quote! { #(#recv_idents3),* }
    };

    let macro_out = quote! {
        impl #impl_generics #name #ty_generics #where_clause {
            pub fn new(#(#state_idents: #state_types),*) -> Self {
                #name {
                    #(#recv_idents4: None,)*
                    #(#send_idents3: Vec::new(),)*
                    #(#state_idents2,)*
                }
            }
        }

        impl #impl_generics ::tablet_filters::node::Node for #name #ty_generics #where_clause {
            fn call(&mut self) -> Result<(), ::tablet_filters::node::NodeError> {
                #(
                    let #recv_idents = match self.#recv_idents2 {
                        Some(ref r) => r
                            .recv()
                            .map_err(|_| ::tablet_filters::node::NodeError::DataEnd)?,
                        None => return Err(::tablet_filters::node::NodeError::PermanentError),
                    };
                )*
                #[allow(unused_variables)]
                let res = self.run(#run_args)?;
                #(
                    for send in &self.#send_idents {
                        send.send(res.clone())
                            .map_err(|_| ::tablet_filters::node::NodeError::CommError)?;
                    }
                )*
                Ok(())
            }

            fn is_connected(&self) -> bool {
                true #(&& self.#recv_idents.is_some())* #(&& !self.#send_idents2.is_empty())*
            }
        }
    };
    macro_out.into()
}

fn parse_type(field: &syn::Field) -> FieldType {
    if let syn::Type::Path(ref type_path) = field.ty {
        if let Some(segment) = type_path.path.segments.last() {
            if segment.ident == "NodeReceiver" {
                return FieldType::Input;
            }
            if segment.ident == "NodeSender" {
                return FieldType::Output;
            }
        }
    }
    FieldType::State
}
