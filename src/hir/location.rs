//! Location stack: what declaration context the walker is inside.
//!
//! One vector of tagged frames holds every location. Type and routine frames
//! are additionally indexed so the innermost of each kind is O(1) to find.
//! The indices are maintained only by `push`/`pop` here and cannot drift out
//! of step with the frames.

use std::sync::Arc;

use tracing::trace;

use super::errors::AnalysisFault;
use super::symbols::{ConstValue, Routine, TypeDecl};
use super::variables::{LabelTable, VariablesTable};

/// Kind of location. An empty stack means global code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LocationKind {
    GlobalCode,
    FunctionDecl,
    MethodDecl,
    TypeDecl,
    ActualParams,
    Switch,
}

/// A function or method being declared.
#[derive(Debug)]
pub struct RoutineFrame {
    pub routine: Arc<Routine>,
    /// Stack depth at which the routine was entered.
    pub nesting_level: usize,
    pub locals: VariablesTable,
    pub labels: LabelTable,
}

#[derive(Debug)]
pub struct TypeFrame {
    pub decl: Arc<TypeDecl>,
    pub nesting_level: usize,
}

/// Arguments of a call whose target is `target`.
#[derive(Debug)]
pub struct ActualParamsFrame {
    target: Arc<Routine>,
    current: Option<usize>,
    count: usize,
}

impl ActualParamsFrame {
    /// Advance to the next actual argument.
    pub fn move_next(&mut self) -> Result<usize, AnalysisFault> {
        let next = self.current.map_or(0, |i| i + 1);
        if next >= self.count {
            return Err(AnalysisFault::ActualParamOverflow {
                index: next,
                count: self.count,
            });
        }
        self.current = Some(next);
        Ok(next)
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn passed_by_ref(&self) -> Result<bool, AnalysisFault> {
        let index = self.current.ok_or(AnalysisFault::NoCurrentActualParam)?;
        Ok(self.target.signature().is_alias(index))
    }

    pub fn decl_is_unknown(&self) -> bool {
        self.target.signature().is_unknown()
    }
}

#[derive(Debug, Default)]
pub struct SwitchFrame {
    pub const_cases: Vec<ConstValue>,
    pub contains_default: bool,
}

#[derive(Debug)]
enum Frame {
    Routine(RoutineFrame),
    Type(TypeFrame),
    ActualParams(ActualParamsFrame),
    Switch(SwitchFrame),
}

impl Frame {
    fn kind(&self) -> LocationKind {
        match self {
            Frame::Routine(f) if f.routine.is_function() => LocationKind::FunctionDecl,
            Frame::Routine(_) => LocationKind::MethodDecl,
            Frame::Type(_) => LocationKind::TypeDecl,
            Frame::ActualParams(_) => LocationKind::ActualParams,
            Frame::Switch(_) => LocationKind::Switch,
        }
    }
}

#[derive(Debug, Default)]
pub struct LocationStack {
    frames: Vec<Frame>,
    type_indices: Vec<usize>,
    routine_indices: Vec<usize>,
}

impl LocationStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn current_kind(&self) -> LocationKind {
        self.frames
            .last()
            .map_or(LocationKind::GlobalCode, Frame::kind)
    }

    // ------------------------------------------------------------------
    // push
    // ------------------------------------------------------------------

    pub fn push_routine(&mut self, routine: Arc<Routine>) {
        trace!(routine = %routine.full_name(), depth = self.frames.len(), "enter routine");
        self.routine_indices.push(self.frames.len());
        self.frames.push(Frame::Routine(RoutineFrame {
            routine,
            nesting_level: self.frames.len(),
            locals: VariablesTable::new(),
            labels: LabelTable::new(),
        }));
    }

    pub fn push_type(&mut self, decl: Arc<TypeDecl>) {
        trace!(ty = %decl.name(), depth = self.frames.len(), "enter type");
        self.type_indices.push(self.frames.len());
        self.frames.push(Frame::Type(TypeFrame {
            decl,
            nesting_level: self.frames.len(),
        }));
    }

    pub fn push_actual_params(&mut self, target: Arc<Routine>, count: usize) {
        self.frames.push(Frame::ActualParams(ActualParamsFrame {
            target,
            current: None,
            count,
        }));
    }

    pub fn push_switch(&mut self) {
        self.frames.push(Frame::Switch(SwitchFrame::default()));
    }

    // ------------------------------------------------------------------
    // pop
    // ------------------------------------------------------------------

    fn pop_expecting(&mut self, expected: LocationKind) -> Result<Frame, AnalysisFault> {
        let found = self.current_kind();
        if found != expected {
            return Err(if self.frames.is_empty() {
                AnalysisFault::EmptyLocationStack { expected }
            } else {
                AnalysisFault::LocationMismatch { expected, found }
            });
        }
        let frame = self
            .frames
            .pop()
            .ok_or(AnalysisFault::EmptyLocationStack { expected })?;
        match frame {
            Frame::Routine(_) => {
                self.routine_indices.pop();
            }
            Frame::Type(_) => {
                self.type_indices.pop();
            }
            Frame::ActualParams(_) | Frame::Switch(_) => {}
        }
        trace!(?expected, depth = self.frames.len(), "leave location");
        Ok(frame)
    }

    /// Pop a function or method frame of the given kind.
    pub fn pop_routine(&mut self, kind: LocationKind) -> Result<RoutineFrame, AnalysisFault> {
        match self.pop_expecting(kind)? {
            Frame::Routine(frame) => Ok(frame),
            other => Err(AnalysisFault::LocationMismatch {
                expected: kind,
                found: other.kind(),
            }),
        }
    }

    pub fn pop_type(&mut self) -> Result<TypeFrame, AnalysisFault> {
        match self.pop_expecting(LocationKind::TypeDecl)? {
            Frame::Type(frame) => Ok(frame),
            other => Err(AnalysisFault::LocationMismatch {
                expected: LocationKind::TypeDecl,
                found: other.kind(),
            }),
        }
    }

    pub fn pop_actual_params(&mut self) -> Result<(), AnalysisFault> {
        self.pop_expecting(LocationKind::ActualParams).map(|_| ())
    }

    pub fn pop_switch(&mut self) -> Result<SwitchFrame, AnalysisFault> {
        match self.pop_expecting(LocationKind::Switch)? {
            Frame::Switch(frame) => Ok(frame),
            other => Err(AnalysisFault::LocationMismatch {
                expected: LocationKind::Switch,
                found: other.kind(),
            }),
        }
    }

    // ------------------------------------------------------------------
    // queries
    // ------------------------------------------------------------------

    pub fn current_type(&self) -> Option<&Arc<TypeDecl>> {
        let index = *self.type_indices.last()?;
        match &self.frames[index] {
            Frame::Type(frame) => Some(&frame.decl),
            _ => None,
        }
    }

    pub fn current_routine(&self) -> Option<&Arc<Routine>> {
        self.current_routine_frame().map(|f| &f.routine)
    }

    pub fn current_routine_frame(&self) -> Option<&RoutineFrame> {
        let index = *self.routine_indices.last()?;
        match &self.frames[index] {
            Frame::Routine(frame) => Some(frame),
            _ => None,
        }
    }

    pub fn current_routine_frame_mut(&mut self) -> Option<&mut RoutineFrame> {
        let index = *self.routine_indices.last()?;
        match &mut self.frames[index] {
            Frame::Routine(frame) => Some(frame),
            _ => None,
        }
    }

    /// Enclosing type declarations, innermost first.
    pub fn enclosing_types(&self) -> impl Iterator<Item = &Arc<TypeDecl>> {
        self.type_indices.iter().rev().filter_map(|&i| match &self.frames[i] {
            Frame::Type(frame) => Some(&frame.decl),
            _ => None,
        })
    }

    /// The innermost frame, which must be an actual-parameter list.
    pub fn actual_params_mut(&mut self) -> Result<&mut ActualParamsFrame, AnalysisFault> {
        let found = self.current_kind();
        match self.frames.last_mut() {
            Some(Frame::ActualParams(frame)) => Ok(frame),
            _ => Err(AnalysisFault::WrongLocation {
                expected: LocationKind::ActualParams,
                found,
            }),
        }
    }

    pub fn actual_params(&self) -> Result<&ActualParamsFrame, AnalysisFault> {
        match self.frames.last() {
            Some(Frame::ActualParams(frame)) => Ok(frame),
            _ => Err(AnalysisFault::WrongLocation {
                expected: LocationKind::ActualParams,
                found: self.current_kind(),
            }),
        }
    }

    /// The innermost frame, which must be a switch.
    pub fn switch_mut(&mut self) -> Result<&mut SwitchFrame, AnalysisFault> {
        let found = self.current_kind();
        match self.frames.last_mut() {
            Some(Frame::Switch(frame)) => Ok(frame),
            _ => Err(AnalysisFault::WrongLocation {
                expected: LocationKind::Switch,
                found,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::QualifiedName;
    use crate::hir::symbols::{FormalParam, RoutineSignature, Visibility};

    fn class(name: &str) -> Arc<TypeDecl> {
        TypeDecl::builder(QualifiedName::parse(name).unwrap()).build()
    }

    fn function(name: &str) -> Arc<Routine> {
        Arc::new(Routine::function(name, RoutineSignature::default()))
    }

    #[test]
    fn test_nested_frames_track_innermost() {
        let mut stack = LocationStack::new();
        assert_eq!(stack.current_kind(), LocationKind::GlobalCode);

        let outer = class("Outer");
        stack.push_type(Arc::clone(&outer));
        let m = Arc::new(Routine::method(
            outer.name().clone(),
            "run",
            Visibility::Public,
            RoutineSignature::default(),
        ));
        stack.push_routine(Arc::clone(&m));
        stack.push_switch();

        assert_eq!(stack.current_kind(), LocationKind::Switch);
        assert_eq!(stack.current_type().unwrap().name(), outer.name());
        assert_eq!(stack.current_routine().unwrap().name(), m.name());
        assert_eq!(stack.current_routine_frame().unwrap().nesting_level, 1);

        stack.pop_switch().unwrap();
        stack.pop_routine(LocationKind::MethodDecl).unwrap();
        stack.pop_type().unwrap();
        assert!(stack.is_empty());
        assert!(stack.current_type().is_none());
        assert!(stack.current_routine().is_none());
    }

    #[test]
    fn test_pop_wrong_kind_is_fault() {
        let mut stack = LocationStack::new();
        stack.push_routine(function("f"));

        assert_eq!(
            stack.pop_type().unwrap_err(),
            AnalysisFault::LocationMismatch {
                expected: LocationKind::TypeDecl,
                found: LocationKind::FunctionDecl,
            }
        );
        assert_eq!(
            stack.pop_routine(LocationKind::MethodDecl).unwrap_err(),
            AnalysisFault::LocationMismatch {
                expected: LocationKind::MethodDecl,
                found: LocationKind::FunctionDecl,
            }
        );
        stack.pop_routine(LocationKind::FunctionDecl).unwrap();
        assert_eq!(
            stack.pop_switch().unwrap_err(),
            AnalysisFault::EmptyLocationStack {
                expected: LocationKind::Switch
            }
        );
    }

    #[test]
    fn test_actual_params_by_ref() {
        let mut stack = LocationStack::new();
        let target = Arc::new(Routine::function(
            "swap",
            RoutineSignature::new(vec![FormalParam::by_ref("a"), FormalParam::by_value("b")]),
        ));
        stack.push_actual_params(target, 2);

        assert_eq!(
            stack.actual_params().unwrap().passed_by_ref(),
            Err(AnalysisFault::NoCurrentActualParam)
        );
        stack.actual_params_mut().unwrap().move_next().unwrap();
        assert_eq!(stack.actual_params().unwrap().passed_by_ref(), Ok(true));
        stack.actual_params_mut().unwrap().move_next().unwrap();
        assert_eq!(stack.actual_params().unwrap().passed_by_ref(), Ok(false));
        assert_eq!(
            stack.actual_params_mut().unwrap().move_next(),
            Err(AnalysisFault::ActualParamOverflow { index: 2, count: 2 })
        );

        stack.pop_actual_params().unwrap();
        assert!(stack.actual_params().is_err());
    }

    #[test]
    fn test_enclosing_types_innermost_first() {
        let mut stack = LocationStack::new();
        stack.push_type(class("A"));
        stack.push_routine(function("f"));
        stack.push_type(class("B"));

        let names: Vec<String> = stack.enclosing_types().map(|t| t.name().to_string()).collect();
        assert_eq!(names, ["B", "A"]);
    }
}
