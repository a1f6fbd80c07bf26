//! End-to-end analysis of small programs.
//!
//! Trees are built directly and run through [`Compilation`], so every test
//! exercises all passes in order.

use std::sync::Arc;

use quill::base::{GenericQualifiedName, PrimitiveType, QualifiedName, SourceId, Span, TypeArgument};
use quill::hir::{
    codes, AnalysisFault, ConstValue, Diagnostic, RoutineProperties, SourceUnit, SymbolTable, UnitCatalog,
    VariablesTable,
};
use quill::project::{analyze_batch, Compilation};
use quill::syntax::{
    ArgumentPassing, ClassDecl, Expr, FunctionDecl, GlobalCode, MethodDecl, NamespaceDecl, Param, Stmt,
    StmtKind, SwitchItem, Unreachable,
};

// ============================================================================
// HELPERS
// ============================================================================

fn sp(line: u32) -> Span {
    Span::at(line, 1)
}

fn qn(text: &str) -> QualifiedName {
    QualifiedName::parse(text).unwrap()
}

fn unit(id: u32, table: &Arc<SymbolTable>) -> Arc<dyn SourceUnit> {
    Arc::new(UnitCatalog::new(SourceId::new(id), Arc::clone(table)))
}

fn run(statements: Vec<Stmt>) -> (Compilation, Vec<Diagnostic>) {
    let table = SymbolTable::new();
    let mut compilation = Compilation::default().with_unit(unit(0, &table), GlobalCode::new(statements));
    let diagnostics = compilation.run().unwrap();
    (compilation, diagnostics)
}

fn count(diagnostics: &[Diagnostic], code: &str) -> usize {
    diagnostics.iter().filter(|d| d.code == code).count()
}

fn call(name: &str, args: Vec<Expr>, line: u32) -> Stmt {
    Stmt::expr(Expr::call(qn(name), args, sp(line)))
}

fn function(name: &str, params: Vec<Param>, body: Vec<Stmt>) -> Stmt {
    Stmt::new(StmtKind::Function(FunctionDecl::new(name, params, body, sp(1))), sp(1))
}

fn class(decl: ClassDecl) -> Stmt {
    let span = decl.span;
    Stmt::new(StmtKind::Class(decl), span)
}

fn int(value: i64, line: u32) -> Expr {
    Expr::literal(ConstValue::Int(value), sp(line))
}

fn ret(line: u32) -> Stmt {
    Stmt::new(StmtKind::Return(None), sp(line))
}

// ============================================================================
// NAMES
// ============================================================================

#[test]
fn test_unknown_function_is_reported_once() {
    let (_, diagnostics) = run(vec![call("missing", vec![], 1)]);
    assert_eq!(count(&diagnostics, codes::UNKNOWN_FUNCTION), 1);
}

#[test]
fn test_call_binds_to_function_declared_later() {
    let (_, diagnostics) = run(vec![call("later", vec![], 1), function("later", vec![], vec![])]);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
}

#[test]
fn test_call_binds_across_units() {
    let table = SymbolTable::new();
    let mut compilation = Compilation::default()
        .with_unit(unit(0, &table), GlobalCode::new(vec![call("helper", vec![], 1)]))
        .with_unit(unit(1, &table), GlobalCode::new(vec![function("helper", vec![], vec![])]));

    let diagnostics = compilation.run().unwrap();
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
}

#[test]
fn test_namespaced_declarations() {
    let body = vec![
        function("helper", vec![], vec![]),
        call("helper", vec![], 2),
        Stmt::expr(Expr::new_object(qn("Model"), vec![], sp(3))),
        class(ClassDecl::new("Model", sp(4))),
    ];
    let namespace = NamespaceDecl::new(&qn("App"), body, sp(1));
    let (_, diagnostics) = run(vec![
        Stmt::new(StmtKind::Namespace(namespace), sp(1)),
        call("App\\helper", vec![], 5),
        call("helper", vec![], 6),
    ]);

    assert_eq!(count(&diagnostics, codes::UNKNOWN_FUNCTION), 1, "{diagnostics:?}");
    assert_eq!(diagnostics.len(), 1);
}

#[test]
fn test_alias_translation() {
    let table = SymbolTable::new();
    let namespace = QualifiedName::namespace(vec!["App".into(), "Models".into()]);
    let models = Arc::new(UnitCatalog::new(SourceId::new(0), Arc::clone(&table)).with_namespace(namespace));
    let user = Arc::new(UnitCatalog::new(SourceId::new(1), Arc::clone(&table)));
    user.add_alias("M", qn("App\\Models"));

    let mut compilation = Compilation::default()
        .with_unit(models, GlobalCode::new(vec![class(ClassDecl::new("User", sp(1)))]))
        .with_unit(
            user,
            GlobalCode::new(vec![
                Stmt::expr(Expr::new_object(qn("M\\User"), vec![], sp(1))),
                Stmt::expr(Expr::new_object(qn("M\\Ghost"), vec![], sp(2))),
            ]),
        );

    let diagnostics = compilation.run().unwrap();
    assert_eq!(count(&diagnostics, codes::UNKNOWN_CLASS_WITH_ALIAS), 1, "{diagnostics:?}");
    assert_eq!(count(&diagnostics, codes::UNKNOWN_CLASS), 0);
}

fn when(cond: &str, then_body: Vec<Stmt>) -> Stmt {
    let branch = StmtKind::If {
        cond: Expr::variable(cond, sp(1)),
        then_body,
        else_body: vec![],
    };
    Stmt::new(branch, sp(1))
}

#[test]
fn test_conditional_function_is_callable_where_declared() {
    let (_, diagnostics) = run(vec![when(
        "flag",
        vec![function("helper", vec![], vec![]), call("helper", vec![], 2)],
    )]);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
}

#[test]
fn test_conditional_class_is_instantiable_where_declared() {
    let (_, diagnostics) = run(vec![when(
        "flag",
        vec![
            class(ClassDecl::new("Box", sp(2))),
            Stmt::expr(Expr::new_object(qn("Box"), vec![], sp(3))),
        ],
    )]);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
}

#[test]
fn test_nested_function_is_callable_from_its_parent() {
    let (_, diagnostics) = run(vec![function(
        "outer",
        vec![],
        vec![function("inner", vec![], vec![]), call("inner", vec![], 2)],
    )]);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
}

#[test]
fn test_later_conditional_function_is_hidden_from_earlier_one() {
    let (_, diagnostics) = run(vec![
        when("a", vec![function("first", vec![], vec![call("second", vec![], 2)])]),
        when("b", vec![function("second", vec![], vec![])]),
    ]);
    assert_eq!(count(&diagnostics, codes::UNKNOWN_FUNCTION), 1, "{diagnostics:?}");
}

#[test]
fn test_reserved_class_name() {
    let (_, diagnostics) = run(vec![class(ClassDecl::new("parent", sp(1)))]);
    assert_eq!(count(&diagnostics, codes::RESERVED_CLASS_NAME), 1);
}

// ============================================================================
// MEMBERS
// ============================================================================

#[test]
fn test_self_call_to_missing_method() {
    let method = MethodDecl::new(
        "f",
        vec![],
        vec![Stmt::expr(Expr::static_call(QualifiedName::SELF_CLASS, "g", vec![], sp(3)))],
        sp(2),
    );
    let (_, diagnostics) = run(vec![class(ClassDecl::new("A", sp(1)).with_method(method))]);

    assert_eq!(count(&diagnostics, codes::UNKNOWN_METHOD), 1, "{diagnostics:?}");
    assert_eq!(diagnostics[0].start.line, 3);
}

#[test]
fn test_static_call_served_by_call_static() {
    let magic = MethodDecl::new("__callStatic", vec![Param::new("name"), Param::new("args")], vec![], sp(2)).static_();
    let (compilation, diagnostics) = run(vec![
        class(ClassDecl::new("Magic", sp(1)).with_method(magic)),
        Stmt::expr(Expr::static_call(qn("Magic"), "anything", vec![], sp(4))),
    ]);

    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    let StmtKind::Expr(call) = &compilation.units()[0].code.statements[1].kind else {
        panic!("expected an expression statement");
    };
    let resolution = call.props.get_typed::<quill::hir::MethodResolution>().unwrap();
    assert!(resolution.is_call_method);
}

#[test]
fn test_function_in_incomplete_type_is_deferred() {
    let inner = function("inner", vec![], vec![]);
    let method = MethodDecl::new("m", vec![], vec![inner], sp(2));
    let decl = ClassDecl::new("B", sp(1)).with_base(qn("Missing")).with_method(method);
    let (compilation, diagnostics) = run(vec![class(decl)]);

    assert_eq!(count(&diagnostics, codes::UNKNOWN_CLASS), 1, "{diagnostics:?}");

    let StmtKind::Class(decl) = &compilation.units()[0].code.statements[0].kind else {
        panic!("expected a class");
    };
    assert!(!decl.type_decl().unwrap().is_complete());
    let StmtKind::Function(inner) = &decl.methods[0].body[0].kind else {
        panic!("expected a function");
    };
    let routine = inner.routine().unwrap();
    assert!(routine.properties().contains(RoutineProperties::DEFERRED_DECLARATION));
}

#[test]
fn test_generic_arity_mismatch() {
    let generic = ClassDecl::new("Pair", sp(1)).with_generic_param("K").with_generic_param("V");
    let instance = GenericQualifiedName::new(qn("Pair"), vec![TypeArgument::Primitive(PrimitiveType::Integer)]);
    let (_, diagnostics) = run(vec![
        class(generic),
        Stmt::expr(Expr::new_object(instance, vec![], sp(3))),
    ]);

    assert_eq!(count(&diagnostics, codes::GENERIC_ARITY_MISMATCH), 1, "{diagnostics:?}");
    assert_eq!(diagnostics[0].start.line, 3);
}

// ============================================================================
// ARGUMENTS & VARIABLES
// ============================================================================

#[test]
fn test_by_ref_argument_marks_local() {
    let takes_ref = function("fill", vec![Param::by_ref("out")], vec![]);
    let caller = function(
        "caller",
        vec![],
        vec![call("fill", vec![Expr::variable("buffer", sp(3))], 3)],
    );
    let (compilation, diagnostics) = run(vec![takes_ref, caller]);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");

    let StmtKind::Function(caller) = &compilation.units()[0].code.statements[1].kind else {
        panic!("expected a function");
    };
    let locals = caller.props.get_typed::<VariablesTable>().unwrap();
    assert!(locals.get(&"buffer".into()).unwrap().is_ref);

    let StmtKind::Expr(call) = &caller.body[0].kind else {
        panic!("expected a call");
    };
    let quill::syntax::ExprKind::Call { args, .. } = &call.kind else {
        panic!("expected a call");
    };
    let passing = args[0].props.get_typed::<ArgumentPassing>().unwrap();
    assert!(passing.by_ref);
    assert!(!passing.target_unknown);
}

#[test]
fn test_unknown_callee_makes_arguments_ref() {
    let caller = function(
        "caller",
        vec![],
        vec![call("nowhere", vec![Expr::variable("x", sp(2))], 2)],
    );
    let (compilation, _) = run(vec![caller]);

    let StmtKind::Function(caller) = &compilation.units()[0].code.statements[0].kind else {
        panic!("expected a function");
    };
    let locals = caller.props.get_typed::<VariablesTable>().unwrap();
    assert!(locals.get(&"x".into()).unwrap().is_ref);
}

#[test]
fn test_global_code_variables_are_all_ref() {
    let (compilation, _) = run(vec![Stmt::expr(Expr::assign("x", int(1, 1), sp(1)))]);
    let globals = compilation.units()[0].code.variables().unwrap();
    assert!(globals.is_all_ref());
    assert!(globals.get(&"x".into()).unwrap().is_ref);
}

// ============================================================================
// CONTROL FLOW
// ============================================================================

#[test]
fn test_duplicate_switch_cases() {
    let case = |line| SwitchItem::Case {
        value: int(5, line),
        body: vec![],
        span: sp(line),
    };
    let switch = Stmt::new(
        StmtKind::Switch {
            subject: Expr::variable("x", sp(1)),
            items: vec![case(2), case(3), case(4)],
        },
        sp(1),
    );
    let (_, diagnostics) = run(vec![switch]);

    assert_eq!(count(&diagnostics, codes::DUPLICATE_SWITCH_CASE), 2);
    let lines: Vec<_> = diagnostics.iter().map(|d| d.start.line).collect();
    assert_eq!(lines, vec![3, 4]);
}

#[test]
fn test_unreachable_code_after_return() {
    let body = vec![
        ret(2),
        Stmt::expr(Expr::variable("a", sp(3))),
        Stmt::expr(Expr::variable("b", sp(4))),
    ];
    let (compilation, diagnostics) = run(vec![function("f", vec![], body)]);

    assert_eq!(count(&diagnostics, codes::UNREACHABLE_CODE), 1);
    let StmtKind::Function(f) = &compilation.units()[0].code.statements[0].kind else {
        panic!("expected a function");
    };
    assert!(f.body[1].props.get_typed::<Unreachable>().is_some());
    assert!(f.body[2].is_unreachable());
}

#[test]
fn test_declaration_after_global_return_is_valid() {
    let (_, diagnostics) = run(vec![
        call("late", vec![], 1),
        ret(2),
        function("late", vec![], vec![]),
    ]);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
}

#[test]
fn test_code_after_branch_is_reachable() {
    let branch = Stmt::new(
        StmtKind::If {
            cond: Expr::variable("c", sp(1)),
            then_body: vec![ret(2)],
            else_body: vec![],
        },
        sp(1),
    );
    let (_, diagnostics) = run(vec![function(
        "f",
        vec![],
        vec![branch, Stmt::expr(Expr::variable("a", sp(3)))],
    )]);
    assert_eq!(count(&diagnostics, codes::UNREACHABLE_CODE), 0);
}

#[test]
fn test_break_level_beyond_nesting() {
    let body = vec![Stmt::new(StmtKind::Break(2), sp(2))];
    let while_loop = Stmt::new(
        StmtKind::While {
            cond: Expr::variable("go", sp(1)),
            body,
        },
        sp(1),
    );
    let (_, diagnostics) = run(vec![while_loop]);
    assert_eq!(count(&diagnostics, codes::INVALID_BREAK_LEVEL), 1);
}

#[test]
fn test_break_zero_inside_loop() {
    let while_loop = Stmt::new(
        StmtKind::While {
            cond: Expr::variable("go", sp(1)),
            body: vec![Stmt::new(StmtKind::Break(0), sp(2))],
        },
        sp(1),
    );
    let (_, diagnostics) = run(vec![while_loop]);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
}

#[test]
fn test_goto_to_undefined_label() {
    let body = vec![
        Stmt::new(StmtKind::Goto("nowhere".into()), sp(2)),
        Stmt::new(StmtKind::Label("unused".into()), sp(3)),
    ];
    let (_, diagnostics) = run(vec![function("f", vec![], body)]);

    assert_eq!(count(&diagnostics, codes::UNDEFINED_LABEL), 1);
    assert_eq!(count(&diagnostics, codes::UNUSED_LABEL), 1);
}

// ============================================================================
// DRIVERS
// ============================================================================

#[test]
fn test_compilation_runs_once() {
    let (mut compilation, _) = run(vec![]);
    assert!(matches!(
        compilation.run(),
        Err(AnalysisFault::StateRegression { .. })
    ));
}

#[test]
fn test_batch_results_keep_input_order() {
    let job = |statements: Vec<Stmt>| {
        let table = SymbolTable::new();
        Compilation::default().with_unit(unit(0, &table), GlobalCode::new(statements))
    };
    let jobs = vec![
        job(vec![]),
        job(vec![call("a", vec![], 1), call("b", vec![], 2)]),
        job(vec![call("c", vec![], 1)]),
    ];

    let counts: Vec<usize> = analyze_batch(jobs)
        .into_iter()
        .map(|result| result.unwrap().len())
        .collect();
    assert_eq!(counts, vec![0, 2, 1]);
}
