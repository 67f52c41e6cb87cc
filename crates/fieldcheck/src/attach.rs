//! Attachment API: bind rules to one or more fields.
//!
//! ## Example
//!
//! ```rust,ignore
//! use fieldcheck::prelude::*;
//!
//! let mut username = Selection::of(field.clone());
//! username
//!     .validates_presence(RuleOptions::new())
//!     .validates_length(RuleOptions::new().minimum(3).maximum(20))
//!     .validates_uniqueness(RuleOptions::new().source(Source::remote(
//!         "https://example.com/users/lookup",
//!     )));
//! ```

use crate::binding::Binding;
use crate::config::RuleConfig;
use crate::field::Field;
use crate::options::{RuleKind, RuleOptions, Source};
use crate::rules::{HttpLookup, LookupTransport};
use crate::settings::Settings;
use std::sync::Arc;

/// A set of fields that rules are attached to.
///
/// Each attachment method binds the rule to every field in the selection and
/// returns the selection for chaining. Rules stay attached when the selection
/// is dropped.
pub struct Selection {
    fields: Vec<Arc<dyn Field>>,
    settings: Settings,
    transport: Option<Arc<dyn LookupTransport>>,
    bindings: Vec<Binding>,
}

impl Selection {
    pub fn new(fields: Vec<Arc<dyn Field>>) -> Self {
        Self {
            fields,
            settings: Settings::default(),
            transport: None,
            bindings: Vec::new(),
        }
    }

    /// Select a single field.
    pub fn of<F: Field + 'static>(field: Arc<F>) -> Self {
        Self::new(vec![field as Arc<dyn Field>])
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Transport for remote uniqueness lookups (default: [`HttpLookup`]).
    pub fn with_transport(mut self, transport: Arc<dyn LookupTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn validates_presence(&mut self, options: RuleOptions) -> &mut Self {
        self.attach(RuleKind::Presence, options)
    }

    pub fn validates_format(&mut self, options: RuleOptions) -> &mut Self {
        self.attach(RuleKind::Format, options)
    }

    pub fn validates_length(&mut self, options: RuleOptions) -> &mut Self {
        self.attach(RuleKind::Length, options)
    }

    pub fn validates_numericality(&mut self, options: RuleOptions) -> &mut Self {
        self.attach(RuleKind::Numericality, options)
    }

    pub fn validates_uniqueness(&mut self, options: RuleOptions) -> &mut Self {
        self.attach(RuleKind::Uniqueness, options)
    }

    /// Attach a custom rule driven by `validates_with`.
    pub fn validates(&mut self, options: RuleOptions) -> &mut Self {
        self.attach(RuleKind::Custom, options)
    }

    /// Attach a rule of `kind` to every selected field.
    ///
    /// Each field gets its own merged configuration and, for remote rules,
    /// its own lookup coordinator.
    pub fn attach(&mut self, kind: RuleKind, options: RuleOptions) -> &mut Self {
        if kind == RuleKind::Custom && options.validates_with.is_none() {
            tracing::error!(
                "Custom rule attached without a validator function; it will always report invalid"
            );
        }

        let remote = kind == RuleKind::Uniqueness
            && matches!(options.source, Some(Source::Remote(_)));
        let transport = remote.then(|| self.transport());

        for field in &self.fields {
            let options = RuleOptions {
                scope: options.scope.clone().or_else(|| Some(self.settings.scope.clone())),
                query_param: options
                    .query_param
                    .clone()
                    .or_else(|| Some(self.settings.query_param.clone())),
                ..options.clone()
            };
            let config = RuleConfig::merge(kind, options);

            let binding = Binding::attach(
                field,
                config,
                transport.clone(),
                self.settings.lookup_timeout(),
            );
            self.bindings.push(binding);
        }
        self
    }

    fn transport(&mut self) -> Arc<dyn LookupTransport> {
        self.transport
            .get_or_insert_with(|| Arc::new(HttpLookup::new()))
            .clone()
    }

    pub fn fields(&self) -> &[Arc<dyn Field>] {
        &self.fields
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Wait until no binding of this selection has a lookup in flight.
    pub async fn settle(&self) {
        for binding in &self.bindings {
            binding.settle().await;
        }
    }

    /// Detach every rule attached through this selection.
    pub fn detach(self) {
        for binding in self.bindings {
            binding.detach();
        }
    }
}

impl std::fmt::Debug for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selection")
            .field("fields", &self.fields.len())
            .field("settings", &self.settings)
            .field("bindings", &self.bindings)
            .finish()
    }
}
