//! The analyzer: pass state machine and walker context.
//!
//! A driver runs four passes over every declaration of a compilation:
//!
//! 1. **pre-analysis**: no scope is available; declarations register
//!    themselves with their source unit.
//! 2. **member analysis**: member shapes (bases, signatures, fields).
//! 3. **full analysis**: per unit, with the global scope active; nodes walk
//!    their bodies and call back into the resolver.
//! 4. **post-analysis**: work deferred during full analysis is drained once.
//!
//! Syntax nodes drive the walk (see [`Analyzable`]). While they descend they
//! keep the analyzer's context current through the `enter_*`/`leave_*`
//! operations, which must nest exactly.

use std::sync::Arc;

use tracing::{debug, trace};

use super::config::AnalysisOptions;
use super::constructed::{ConstructedType, ConstructedTypeCache, Origin};
use super::diagnostics::{codes, Diagnostic, DiagnosticCollector, RelatedInfo};
use super::errors::AnalysisFault;
use super::location::{LocationKind, LocationStack, RoutineFrame};
use super::node::{Analyzable, PostAnalyzable};
use super::reachability::Reachability;
use super::symbols::{ConstValue, Routine, RoutineProperties, Scope, TypeDecl};
use super::unit::SourceUnit;
use super::variables::{LabelProblem, LabelTable, VariablesTable};
use crate::base::{QualifiedName, SourceId, Span, VariableName};

/// Pass the analyzer is in. States only move forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AnalyzerState {
    Initial,
    PreAnalysisStarted,
    MemberAnalysisStarted,
    FullAnalysisStarted,
    PostAnalysisStarted,
}

/// A top-level declaration handed to the first two passes.
pub struct Declaration<'a> {
    pub unit: Arc<dyn SourceUnit>,
    pub node: Option<&'a mut dyn Analyzable>,
}

impl<'a> Declaration<'a> {
    pub fn new(unit: Arc<dyn SourceUnit>, node: &'a mut dyn Analyzable) -> Self {
        Self {
            unit,
            node: Some(node),
        }
    }
}

pub struct Analyzer {
    options: AnalysisOptions,
    state: AnalyzerState,
    pub(super) unit: Option<Arc<dyn SourceUnit>>,
    /// Present only during full analysis.
    current_scope: Option<Scope>,
    current_namespace: Option<QualifiedName>,
    namespace_open: bool,
    pub(super) locations: LocationStack,
    reachability: Reachability,
    loop_nesting: usize,
    global_locals: VariablesTable,
    global_labels: LabelTable,
    pub(super) constructed: ConstructedTypeCache,
    /// `None` once drained.
    post_queue: Option<Vec<Box<dyn PostAnalyzable>>>,
    diagnostics: DiagnosticCollector,
    last_scope: u32,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(AnalysisOptions::default())
    }
}

impl Analyzer {
    pub fn new(options: AnalysisOptions) -> Self {
        let diagnostics = DiagnosticCollector::with_policy(options.policy.clone());
        Self {
            options,
            state: AnalyzerState::Initial,
            unit: None,
            current_scope: None,
            current_namespace: None,
            namespace_open: false,
            locations: LocationStack::new(),
            reachability: Reachability::new(),
            loop_nesting: 0,
            global_locals: global_var_table(),
            global_labels: LabelTable::new(),
            constructed: ConstructedTypeCache::new(),
            post_queue: Some(Vec::new()),
            diagnostics,
            last_scope: 0,
        }
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    pub fn state(&self) -> AnalyzerState {
        self.state
    }

    fn advance(&mut self, to: AnalyzerState) -> Result<(), AnalysisFault> {
        if to < self.state {
            return Err(AnalysisFault::StateRegression {
                from: self.state,
                to,
            });
        }
        if to != self.state {
            debug!(from = ?self.state, ?to, "analyzer state");
        }
        self.state = to;
        Ok(())
    }

    // ========================================================================
    // PASSES
    // ========================================================================

    pub fn pre_analyze<'a>(
        &mut self,
        declarations: impl IntoIterator<Item = Declaration<'a>>,
    ) -> Result<(), AnalysisFault> {
        self.advance(AnalyzerState::PreAnalysisStarted)?;
        for decl in declarations {
            self.current_namespace = decl.unit.current_namespace();
            self.unit = Some(decl.unit);
            if let Some(node) = decl.node {
                node.pre_analyze(self)?;
            }
        }
        Ok(())
    }

    pub fn analyze_members<'a>(
        &mut self,
        declarations: impl IntoIterator<Item = Declaration<'a>>,
    ) -> Result<(), AnalysisFault> {
        self.advance(AnalyzerState::MemberAnalysisStarted)?;
        for decl in declarations {
            self.current_namespace = decl.unit.current_namespace();
            self.unit = Some(decl.unit);
            if let Some(node) = decl.node {
                node.analyze_members(self)?;
            }
        }
        Ok(())
    }

    /// Full analysis of one unit. The global scope is active only while
    /// `root` is walked.
    pub fn analyze(&mut self, unit: Arc<dyn SourceUnit>, root: &mut dyn Analyzable) -> Result<(), AnalysisFault> {
        self.advance(AnalyzerState::FullAnalysisStarted)?;
        debug!(unit = %unit.id(), "full analysis");

        self.current_namespace = unit.current_namespace();
        self.namespace_open = false;
        self.unit = Some(unit);
        self.global_locals = global_var_table();
        self.global_labels = LabelTable::new();
        self.current_scope = Some(Scope::GLOBAL);

        let result = root.analyze(self);

        self.current_scope = None;
        result
    }

    /// Drain the deferred work queue, then finalize the constructed types it
    /// created. Runs once.
    pub fn post_analyze(&mut self) -> Result<(), AnalysisFault> {
        self.advance(AnalyzerState::PostAnalysisStarted)?;
        let queue = self.post_queue.take().ok_or(AnalysisFault::PostAnalysisClosed)?;
        debug!(count = queue.len(), "post-analysis");
        for mut item in queue {
            item.post_analyze(self)?;
        }
        // Deferred items may instantiate more generics.
        self.finalize_constructed_types();
        Ok(())
    }

    /// Queue work for post-analysis. Fails once the queue is being drained.
    pub fn defer(&mut self, item: Box<dyn PostAnalyzable>) -> Result<(), AnalysisFault> {
        match &mut self.post_queue {
            Some(queue) => {
                queue.push(item);
                Ok(())
            }
            None => Err(AnalysisFault::PostAnalysisClosed),
        }
    }

    pub fn pending_post_analysis(&self) -> usize {
        self.post_queue.as_ref().map_or(0, Vec::len)
    }

    /// Finalize constructed types created since the last call and report
    /// instantiations whose argument count does not fit the definition.
    pub fn finalize_constructed_types(&mut self) -> usize {
        let finalized = self.constructed.finalize_pending();
        debug!(count = finalized.len(), "constructed types finalized");
        for ty in &finalized {
            self.check_constructed_shape(ty);
        }
        finalized.len()
    }

    /// Finalize one constructed type now. Types already finalized are left
    /// alone.
    pub fn analyze_constructed_type(&mut self, ty: &ConstructedType) {
        if ty.finalize().is_some() {
            self.check_constructed_shape(ty);
        }
    }

    fn check_constructed_shape(&mut self, ty: &ConstructedType) {
        let Some(shape) = ty.shape() else { return };
        if shape.arity_matches() {
            return;
        }
        let origin = ty.origin().unwrap_or(Origin {
            source: self.source_id(),
            span: Span::default(),
        });
        let message = format!(
            "'{}' expects {} type argument(s), {} given",
            ty.generic_type().full_name(),
            shape.expected_arity.unwrap_or_default(),
            shape.actual_arity
        );
        trace!(name = %shape.display_name, "generic arity mismatch");
        self.diagnostics
            .report(codes::GENERIC_ARITY_MISMATCH, origin.source, origin.span, message);
    }

    pub fn constructed_types(&self) -> &ConstructedTypeCache {
        &self.constructed
    }

    // ========================================================================
    // CONTEXT
    // ========================================================================

    pub fn source_unit(&self) -> Result<&Arc<dyn SourceUnit>, AnalysisFault> {
        self.unit.as_ref().ok_or(AnalysisFault::NoSourceUnit)
    }

    pub fn source_id(&self) -> SourceId {
        self.unit.as_ref().map_or(SourceId::default(), |u| u.id())
    }

    pub fn current_scope(&self) -> Option<Scope> {
        self.current_scope
    }

    pub(super) fn require_scope(&self) -> Result<Scope, AnalysisFault> {
        self.current_scope.ok_or(AnalysisFault::ScopeUnavailable)
    }

    /// Scope a name is resolved from: the referring type's, the referring
    /// function's, or the current one.
    pub(super) fn referring_scope(
        &self,
        referring_type: Option<&Arc<TypeDecl>>,
        referring_routine: Option<&Arc<Routine>>,
    ) -> Result<Scope, AnalysisFault> {
        if let Some(ty) = referring_type {
            return Ok(ty.scope());
        }
        match referring_routine {
            Some(routine) if routine.is_function() => Ok(routine.scope()),
            _ => self.require_scope(),
        }
    }

    /// Scope for a declaration made at the current point of the walk.
    pub fn declaration_scope(&mut self) -> Scope {
        if self.reachability.is_conditional() {
            self.last_scope += 1;
            Scope::new(self.last_scope)
        } else {
            Scope::GLOBAL
        }
    }

    pub fn current_namespace(&self) -> Option<&QualifiedName> {
        self.current_namespace.as_ref()
    }

    pub fn enter_namespace(&mut self, namespace: QualifiedName) -> Result<(), AnalysisFault> {
        if self.namespace_open {
            return Err(AnalysisFault::NestedNamespace);
        }
        let namespace = namespace.into_namespace();
        trace!(%namespace, "enter namespace");
        self.namespace_open = true;
        self.current_namespace = Some(namespace);
        Ok(())
    }

    pub fn leave_namespace(&mut self) -> Result<(), AnalysisFault> {
        if !self.namespace_open {
            return Err(AnalysisFault::NoOpenNamespace);
        }
        self.namespace_open = false;
        self.current_namespace = self.unit.as_ref().and_then(|u| u.current_namespace());
        Ok(())
    }

    /// Full name of a declaration written as `name` at this point.
    pub fn qualify_declared_name(&self, name: &QualifiedName) -> QualifiedName {
        match &self.current_namespace {
            Some(ns) if !name.is_fully_qualified() => name.within(ns),
            _ => name.clone().fully_qualified(),
        }
    }

    // ========================================================================
    // LOCATIONS
    // ========================================================================

    pub fn current_location(&self) -> LocationKind {
        self.locations.current_kind()
    }

    pub fn location_depth(&self) -> usize {
        self.locations.depth()
    }

    pub fn current_type(&self) -> Option<Arc<TypeDecl>> {
        self.locations.current_type().cloned()
    }

    pub fn current_routine(&self) -> Option<Arc<Routine>> {
        self.locations.current_routine().cloned()
    }

    /// Whether any enclosing type declaration is incomplete. Functions
    /// declared there can only be bound at runtime.
    pub fn is_inside_incomplete_type(&self) -> bool {
        self.locations.enclosing_types().any(|t| !t.is_complete())
    }

    pub fn add_current_routine_property(&self, property: RoutineProperties) {
        if let Some(routine) = self.locations.current_routine() {
            routine.add_properties(property);
        }
    }

    pub fn enter_function_declaration(&mut self, function: Arc<Routine>) {
        if self.is_inside_incomplete_type() {
            function.add_properties(RoutineProperties::DEFERRED_DECLARATION);
        }
        self.locations.push_routine(function);
        self.reachability.enter_conditional();
    }

    /// Leave a function. Its labels are validated and its frame returned.
    pub fn leave_function_declaration(&mut self) -> Result<RoutineFrame, AnalysisFault> {
        self.leave_routine(LocationKind::FunctionDecl)
    }

    /// Methods are entered only directly inside a type declaration.
    pub fn enter_method_declaration(&mut self, method: Arc<Routine>) -> Result<(), AnalysisFault> {
        let found = self.locations.current_kind();
        if found != LocationKind::TypeDecl {
            return Err(AnalysisFault::MethodOutsideType { found });
        }
        self.locations.push_routine(method);
        self.reachability.enter_conditional();
        Ok(())
    }

    pub fn leave_method_declaration(&mut self) -> Result<RoutineFrame, AnalysisFault> {
        self.leave_routine(LocationKind::MethodDecl)
    }

    fn leave_routine(&mut self, kind: LocationKind) -> Result<RoutineFrame, AnalysisFault> {
        let frame = self.locations.pop_routine(kind)?;
        self.reachability.leave_conditional()?;
        self.report_label_problems(&frame.labels);
        Ok(frame)
    }

    pub fn enter_type_declaration(&mut self, decl: Arc<TypeDecl>) {
        self.locations.push_type(decl);
    }

    pub fn leave_type_declaration(&mut self) -> Result<Arc<TypeDecl>, AnalysisFault> {
        self.locations.pop_type().map(|frame| frame.decl)
    }

    /// Enter the argument list of a call to `target` with `count` arguments.
    pub fn enter_actual_params(&mut self, target: Arc<Routine>, count: usize) {
        self.locations.push_actual_params(target, count);
    }

    pub fn leave_actual_params(&mut self) -> Result<(), AnalysisFault> {
        self.locations.pop_actual_params()
    }

    /// Advance to the next argument; returns its index.
    pub fn enter_act_param(&mut self) -> Result<usize, AnalysisFault> {
        self.locations.actual_params_mut()?.move_next()
    }

    pub fn act_param_passed_by_ref(&self) -> Result<bool, AnalysisFault> {
        self.locations.actual_params()?.passed_by_ref()
    }

    /// Whether the by-reference semantics of the current argument are
    /// unknown (the call target is unresolved).
    pub fn act_param_decl_is_unknown(&self) -> Result<bool, AnalysisFault> {
        Ok(self.locations.actual_params()?.decl_is_unknown())
    }

    pub fn loop_nesting_level(&self) -> usize {
        self.loop_nesting
    }

    pub fn enter_loop_body(&mut self) {
        self.reachability.enter_conditional();
        self.loop_nesting += 1;
    }

    pub fn leave_loop_body(&mut self) -> Result<(), AnalysisFault> {
        self.reachability.leave_conditional()?;
        self.loop_nesting = self
            .loop_nesting
            .checked_sub(1)
            .ok_or(AnalysisFault::LoopNestingUnderflow)?;
        Ok(())
    }

    /// Switch bodies count as loop nesting for `break`/`continue` depth.
    pub fn enter_switch_body(&mut self) {
        self.loop_nesting += 1;
        self.locations.push_switch();
    }

    pub fn leave_switch_body(&mut self) -> Result<(), AnalysisFault> {
        self.locations.pop_switch()?;
        self.loop_nesting = self
            .loop_nesting
            .checked_sub(1)
            .ok_or(AnalysisFault::LoopNestingUnderflow)?;
        Ok(())
    }

    /// Record a constant `case` value; every repeat is reported.
    pub fn add_const_case(&mut self, value: ConstValue, span: Span) -> Result<(), AnalysisFault> {
        let switch = self.locations.switch_mut()?;
        if switch.const_cases.contains(&value) {
            self.report(
                codes::DUPLICATE_SWITCH_CASE,
                span,
                format!("switch contains more than one case with value {value}"),
            );
        } else {
            switch.const_cases.push(value);
        }
        Ok(())
    }

    pub fn add_default(&mut self, span: Span) -> Result<(), AnalysisFault> {
        let switch = self.locations.switch_mut()?;
        if switch.contains_default {
            self.report(codes::DUPLICATE_DEFAULT, span, "switch contains more than one default section");
        } else {
            switch.contains_default = true;
        }
        Ok(())
    }

    // ========================================================================
    // REACHABILITY
    // ========================================================================

    pub fn enter_conditional_code(&mut self) {
        self.reachability.enter_conditional();
    }

    pub fn leave_conditional_code(&mut self) -> Result<(), AnalysisFault> {
        self.reachability.leave_conditional()
    }

    pub fn is_this_code_conditional(&self) -> bool {
        self.reachability.is_conditional()
    }

    pub fn enter_unreachable_code(&mut self) {
        self.reachability.enter_unreachable();
    }

    pub fn leave_unreachable_code(&mut self) {
        self.reachability.leave_unreachable();
    }

    pub fn is_this_code_unreachable(&self) -> bool {
        self.reachability.is_unreachable()
    }

    /// Warn about unreachable code, once per unreachable run.
    pub fn report_unreachable_code(&mut self, span: Span) {
        if self.reachability.take_report() {
            self.report(codes::UNREACHABLE_CODE, span, "unreachable code detected");
        }
    }

    /// Validate a `break`/`continue` depth and make following code
    /// unreachable. A depth of 0 means the innermost loop, same as 1.
    pub fn check_jump_level(&mut self, level: usize, span: Span) {
        if level.max(1) > self.loop_nesting {
            self.report(
                codes::INVALID_BREAK_LEVEL,
                span,
                format!(
                    "cannot break {level} level(s), nesting level is {}",
                    self.loop_nesting
                ),
            );
        }
        self.reachability.enter_unreachable();
    }

    // ========================================================================
    // VARIABLES & LABELS
    // ========================================================================

    /// Variables of the innermost routine, or of global code.
    pub fn current_var_table(&mut self) -> &mut VariablesTable {
        match self.locations.current_routine_frame_mut() {
            Some(frame) => &mut frame.locals,
            None => &mut self.global_locals,
        }
    }

    pub fn current_labels(&mut self) -> &mut LabelTable {
        match self.locations.current_routine_frame_mut() {
            Some(frame) => &mut frame.labels,
            None => &mut self.global_labels,
        }
    }

    pub fn global_var_table(&self) -> &VariablesTable {
        &self.global_locals
    }

    pub fn declare_label(&mut self, name: VariableName, span: Span) {
        let label = name.clone();
        if let Err(previous) = self.current_labels().declare(name, span) {
            let diagnostic = Diagnostic::new(
                codes::LABEL_REDECLARED,
                self.source_id(),
                span,
                format!("label '{label}' is already defined"),
            )
            .with_related(RelatedInfo {
                source: self.source_id(),
                position: previous.start,
                message: Arc::from("previous definition"),
            });
            self.diagnostics.add(diagnostic);
        }
    }

    pub fn reference_label(&mut self, name: VariableName, span: Span) {
        self.current_labels().reference(name, span);
    }

    /// Report problems of the global code's labels.
    pub fn validate_global_labels(&mut self) {
        let labels = std::mem::take(&mut self.global_labels);
        self.report_label_problems(&labels);
        self.global_labels = labels;
    }

    fn report_label_problems(&mut self, labels: &LabelTable) {
        for problem in labels.validate() {
            match problem {
                LabelProblem::Unused { name, span } => {
                    self.report(codes::UNUSED_LABEL, span, format!("label '{name}' is never used"))
                }
                LabelProblem::Undefined { name, span } => {
                    self.report(codes::UNDEFINED_LABEL, span, format!("label '{name}' is not defined"))
                }
            }
        }
    }

    /// A call to `callee` is being analyzed. Callees that read their caller's
    /// locals force every local of the caller to be by-reference.
    pub fn note_callee(&mut self, callee: &Routine, span: Span) {
        if !callee.properties().contains(RoutineProperties::NEEDS_LOCALS) {
            return;
        }
        self.current_var_table().set_all_ref();
        if let Some(routine) = self.current_routine() {
            routine.add_properties(RoutineProperties::NEEDS_LOCALS);
            self.report(
                codes::UNOPTIMIZED_LOCALS,
                span,
                format!(
                    "call to '{}' prevents optimizing the locals of '{}'",
                    callee.full_name(),
                    routine.full_name()
                ),
            );
        }
    }

    /// Reject a type declared with a reserved class name.
    pub fn check_type_declaration_name(&mut self, name: &QualifiedName, span: Span) {
        if self.options.check_reserved_names && name.is_reserved_class_name() {
            self.report(
                codes::RESERVED_CLASS_NAME,
                span,
                format!("cannot use '{name}' as a class name, it is reserved"),
            );
        }
    }

    // ========================================================================
    // DIAGNOSTICS
    // ========================================================================

    pub fn report(&mut self, code: &'static str, span: Span, message: impl Into<Arc<str>>) {
        let source = self.source_id();
        trace!(code, %span, "diagnostic");
        self.diagnostics.report(code, source, span, message);
    }

    pub fn diagnostics(&self) -> &DiagnosticCollector {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.take()
    }
}

fn global_var_table() -> VariablesTable {
    let mut table = VariablesTable::new();
    table.set_all_ref();
    table
}
