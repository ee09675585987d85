use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{
    parse_macro_input,
    visit_mut::{self, VisitMut},
    Expr, ExprCall, Ident, ItemFn,
};

const LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Rewrites `?` and `Err(..)` so that every error leaving the function is logged
/// through the `tracing` macro named by `level`.
struct ErrorLogger {
    level: Ident,
}

fn is_err_call(call: &ExprCall) -> bool {
    let Expr::Path(path) = &*call.func else {
        return false;
    };
    path.path
        .segments
        .last()
        .is_some_and(|segment| segment.ident == "Err")
}

impl VisitMut for ErrorLogger {
    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        let level = self.level.clone();
        match expr {
            Expr::Try(expr_try) => {
                // Inner expressions first, the rewrite wraps whatever they became.
                self.visit_expr_mut(&mut expr_try.expr);

                let inner = &expr_try.expr;
                *expr = syn::parse_quote! {
                    (#inner.inspect_err(|err| { ::tracing::#level!("{}", err); }))?
                };
            }
            Expr::Call(expr_call) if is_err_call(expr_call) && expr_call.args.len() == 1 => {
                for arg in &mut expr_call.args {
                    self.visit_expr_mut(arg);
                }

                let error_expr = &expr_call.args[0];
                *expr = syn::parse_quote! {
                    Err(#error_expr).inspect_err(|err| { ::tracing::#level!("{}", err); })
                };
            }
            // Match arms, if branches and blocks all reach `visit_expr_mut` again through the default walk.
            _ => visit_mut::visit_expr_mut(self, expr),
        }
    }

    // Closures return their own errors, leave them alone.
    fn visit_expr_closure_mut(&mut self, _closure: &mut syn::ExprClosure) {}
}

/// Logs every error propagated out of the annotated function.
///
/// `#[log_errors]` logs at error level, `#[log_errors(warn)]` (or any other
/// `tracing` level name) picks the level explicitly.
#[proc_macro_attribute]
pub fn log_errors(attr: TokenStream, item: TokenStream) -> TokenStream {
    let level = if attr.is_empty() {
        Ident::new("error", Span::call_site())
    } else {
        let level = parse_macro_input!(attr as Ident);
        if !LEVELS.iter().any(|l| level == l) {
            return syn::Error::new(
                level.span(),
                "log_errors expects one of: error, warn, info, debug, trace",
            )
            .to_compile_error()
            .into();
        }
        level
    };

    let mut input_fn = parse_macro_input!(item as ItemFn);
    let mut logger = ErrorLogger { level };
    logger.visit_block_mut(&mut input_fn.block);

    let output = quote! {
        #input_fn
    };

    output.into()
}
