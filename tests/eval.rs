use std::fs;

use tinylisp::{Capture, Interp, LispError, Value};

fn interp() -> Interp {
    Interp::new(8192).unwrap()
}

/// Evaluate `src` and print the last result.
fn run(it: &mut Interp, src: &str) -> String {
    let val = it.eval_str(src).unwrap();
    it.print(val)
}

fn eval_one(src: &str) -> String {
    run(&mut interp(), src)
}

#[test]
fn arithmetic_folds_left_to_right() {
    let cases = [
        ("(+ 1 2)", "3"),
        ("(+ 1 2 3 4)", "10"),
        ("(- 10 3 2)", "5"),
        ("(* 2 3 4)", "24"),
        ("(/ 12 3 2)", "2"),
        ("(- 5)", "5"),
        ("(/ 1 3)", "0.3333333333"),
        ("(int 3.7)", "3"),
        ("(int -3.7)", "-3"),
        ("(int 1e20)", "1e+20"),
        ("(+ 1 'a)", "ERR"),
    ];
    for (src, expected) in cases {
        assert_eq!(eval_one(src), expected, "{}", src);
    }
}

#[test]
fn predicates() {
    let cases = [
        ("(< 1 2)", "#t"),
        ("(< 2 1)", "()"),
        ("(eq? 'a 'a)", "#t"),
        ("(eq? 'a 'b)", "()"),
        ("(eq? 3 3)", "#t"),
        ("(eq? (cons 1 2) (cons 1 2))", "()"),
        ("(pair? (cons 1 2))", "#t"),
        ("(pair? ())", "()"),
        ("(pair? (lambda (x) x))", "()"),
        ("(not ())", "#t"),
        ("(not 0)", "()"),
    ];
    for (src, expected) in cases {
        assert_eq!(eval_one(src), expected, "{}", src);
    }
}

#[test]
fn control_flow() {
    let cases = [
        ("(if (< 1 2) 'yes 'no)", "yes"),
        ("(if () 'yes 'no)", "no"),
        ("(cond ((eq? 1 2) 'a) ((< 1 2) 'b) (#t 'c))", "b"),
        ("(cond (() 'a))", "ERR"),
        ("(and 1 2 3)", "3"),
        ("(and 1 () 3)", "()"),
        ("(and)", "#t"),
        ("(or () 2 3)", "2"),
        ("(or () ())", "()"),
        ("(let* (a 1) (b (+ a 1)) (+ a b))", "3"),
        ("(quote (1 2 . 3))", "(1 2 . 3)"),
        ("(eval '(+ 1 2))", "3"),
    ];
    for (src, expected) in cases {
        assert_eq!(eval_one(src), expected, "{}", src);
    }
}

#[test]
fn value_level_errors_flow_as_values() {
    let mut it = interp();
    assert_eq!(run(&mut it, "(car 42)"), "ERR");
    assert_eq!(run(&mut it, "(cdr 'a)"), "ERR");
    assert_eq!(run(&mut it, "undefined-symbol"), "ERR");
    assert_eq!(run(&mut it, "(eq? (car 1) (cdr 2))"), "#t");
}

#[test]
fn lambdas_and_closures() {
    let mut it = interp();
    assert_eq!(run(&mut it, "((lambda (x y) (* x y)) 6 7)"), "42");
    assert_eq!(
        run(&mut it, "(((lambda (x) (lambda (y) (+ x y))) 5) 10)"),
        "15"
    );
    assert_eq!(run(&mut it, "(define list (lambda args args))"), "list");
    assert_eq!(run(&mut it, "(list 1 2 3)"), "(1 2 3)");
    assert_eq!(run(&mut it, "(list)"), "()");
    assert_eq!(run(&mut it, "((lambda (a . rest) rest) 1 2 3)"), "(2 3)");
}

#[test]
fn recursion_through_globals() {
    let mut it = Interp::new(65_536).unwrap();
    run(
        &mut it,
        "(define fact (lambda (n) (if (< n 2) 1 (* n (fact (- n 1))))))",
    );
    assert_eq!(run(&mut it, "(fact 10)"), "3628800");
    it.reclaim();
    run(
        &mut it,
        "(define fib (lambda (n) (if (< n 2) n (+ (fib (- n 1)) (fib (- n 2))))))",
    );
    assert_eq!(run(&mut it, "(fib 12)"), "144");
}

#[test]
fn define_binds_globally() {
    let mut it = interp();
    assert_eq!(run(&mut it, "(define x 42)"), "x");
    assert_eq!(run(&mut it, "x"), "42");
    run(&mut it, "(define x 7)");
    assert_eq!(run(&mut it, "x"), "7");
}

#[test]
fn global_closures_see_later_definitions() {
    let mut it = interp();
    run(&mut it, "(define h (lambda () z))");
    let h = it.eval_str("h").unwrap();
    assert_eq!(it.closure_capture(h), Some(Capture::Dynamic));
    assert_eq!(run(&mut it, "(h)"), "ERR");
    run(&mut it, "(define z 7)");
    assert_eq!(run(&mut it, "(h)"), "7");
}

#[test]
fn local_closures_keep_their_bindings() {
    let mut it = interp();
    run(&mut it, "(define make (lambda (y) (lambda () y)))");
    run(&mut it, "(define g (make 5))");
    let g = it.eval_str("g").unwrap();
    assert!(matches!(it.closure_capture(g), Some(Capture::Lexical(_))));
    run(&mut it, "(define y 99)");
    assert_eq!(run(&mut it, "(g)"), "5");
}

#[test]
fn interning_is_idempotent() {
    let mut it = interp();
    let a = it.intern("some-name").unwrap();
    let hp = it.arena.hp();
    let b = it.intern("some-name").unwrap();
    assert_eq!(a, b);
    assert_eq!(it.arena.hp(), hp);
    assert_eq!(it.eval_str("'some-name").unwrap(), a);
}

#[test]
fn reclaim_keeps_definitions_alive() {
    let mut it = interp();
    run(&mut it, "(define sq (lambda (x) (* x x)))");
    run(&mut it, "(define four (sq 2))");
    it.reclaim();
    let free = it.free_cells();
    for _ in 0..50 {
        assert_eq!(run(&mut it, "(sq (sq four))"), "256");
        it.reclaim();
        assert_eq!(it.free_cells(), free);
    }
    assert_eq!(run(&mut it, "four"), "4");
}

#[test]
fn exhaustion_is_reported_not_silent() {
    let mut it = Interp::new(512).unwrap();
    run(&mut it, "(define grow (lambda (n) (cons n (grow (+ n 1)))))");
    it.reclaim();
    let err = it.eval_str("(grow 0)").unwrap_err();
    assert!(matches!(err, LispError::OutOfMemory { .. }), "{:?}", err);
    it.reclaim();
    assert_eq!(run(&mut it, "(+ 2 2)"), "4");
}

#[test]
fn load_evaluates_files_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("defs.lisp");
    fs::write(
        &path,
        "; helpers\n(define double (lambda (x) (* 2 x)))\n(define eight (double 4))\n",
    )
    .unwrap();

    let mut it = interp();
    let loaded = run(&mut it, &format!("(load '{})", path.display()));
    assert_eq!(loaded, "eight");
    assert_eq!(run(&mut it, "(double eight)"), "16");
}

#[test]
fn load_reports_sentinels() {
    let dir = tempfile::tempdir().unwrap();
    let broken = dir.path().join("broken.lisp");
    fs::write(&broken, "(define ok 1)\n(+ 1").unwrap();
    let failing = dir.path().join("failing.lisp");
    fs::write(&failing, "(car 5)").unwrap();
    let missing = dir.path().join("missing.lisp");

    let mut it = interp();
    assert_eq!(
        run(&mut it, &format!("(load '{})", broken.display())),
        "PARSE-ERROR"
    );
    assert_eq!(run(&mut it, "ok"), "1");
    assert_eq!(
        run(&mut it, &format!("(load '{})", failing.display())),
        "EVAL-ERROR"
    );
    assert_eq!(
        run(&mut it, &format!("(load '{})", missing.display())),
        "FILE-ERROR"
    );
    assert_eq!(run(&mut it, "(load)"), "MISSING-FILENAME");
    assert_eq!(run(&mut it, "(load 42)"), "INVALID-FILENAME");
}

#[test]
fn interpreters_are_independent() {
    let mut a = interp();
    let mut b = interp();
    run(&mut a, "(define only-here 1)");
    assert_eq!(run(&mut a, "only-here"), "1");
    assert_eq!(run(&mut b, "only-here"), "ERR");
    assert_eq!(b.eval_str("()").unwrap(), Value::Nil);
}
