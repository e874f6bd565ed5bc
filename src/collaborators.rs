//! External collaborator contracts. The syntax tree builder,
//! semantic analyser, document store, feature providers, and the external
//! syntax-checker process are all out of scope; the core talks to them only
//! through these traits so it compiles and is testable without a real
//! compiler frontend.

use lsp_types::{CodeActionOrCommand, Diagnostic, Url};

/// The open-buffer lifecycle. A handler that looks up a URI the
/// store doesn't know about gets `None` back and answers with a null
/// result rather than an error.
pub trait DocumentStore: Send + Sync {
    fn open(&self, uri: &Url, text: String, version: i32);
    fn change(&self, uri: &Url, text: String, version: i32);
    fn save(&self, uri: &Url);
    fn close(&self, uri: &Url);
    fn text(&self, uri: &Url) -> Option<String>;
}

/// The external syntax-checking collaborator, invoked by save-time
/// diagnostics and by autofix.
pub trait SyntaxChecker: Send + Sync {
    fn check(&self, uri: &Url, text: &str) -> Vec<Diagnostic>;
}

/// Turns diagnostics into code actions. Autofix filters this output
/// down to `source.fixAll` actions touching exactly the saved URI.
pub trait CodeActionBuilder: Send + Sync {
    fn build(&self, diagnostics: &[Diagnostic], uri: &Url) -> Vec<CodeActionOrCommand>;
}

/// No-op collaborator used by the crate's own tests and by the `bin/` entry
/// point so the dispatcher runs end to end without a real compiler frontend.
pub struct NullCollaborators;

impl DocumentStore for NullCollaborators {
    fn open(&self, _uri: &Url, _text: String, _version: i32) {}
    fn change(&self, _uri: &Url, _text: String, _version: i32) {}
    fn save(&self, _uri: &Url) {}
    fn close(&self, _uri: &Url) {}
    fn text(&self, _uri: &Url) -> Option<String> {
        None
    }
}

impl SyntaxChecker for NullCollaborators {
    fn check(&self, _uri: &Url, _text: &str) -> Vec<Diagnostic> {
        Vec::new()
    }
}

impl CodeActionBuilder for NullCollaborators {
    fn build(&self, _diagnostics: &[Diagnostic], _uri: &Url) -> Vec<CodeActionOrCommand> {
        Vec::new()
    }
}
