//! Built-in self-test fixtures
//!
//! Each fixture builds a declaration tree and states what compiling it must
//! produce: the exact C text, or the code of the error that stops it.

use crate::driver::{compile, Options};
use crate::frontend::ast::*;
use crate::frontend::builder::*;
use crate::types::PrimitiveType;

/// Expected outcome of a fixture
#[derive(Debug, Clone, Copy)]
pub enum Expected {
    Output(&'static str),
    Error(&'static str),
}

pub struct Fixture {
    pub name: &'static str,
    /// Run type resolution first
    pub resolve: bool,
    pub build: fn() -> SourceFile,
    pub expected: Expected,
}

impl Fixture {
    /// Compile the fixture and compare against its expectation
    pub fn run(&self) -> Result<(), String> {
        let file = (self.build)();
        let options = Options { resolve: self.resolve, ..Options::default() };
        match (compile(&file, &options), self.expected) {
            (Ok(text), Expected::Output(want)) if text == want => Ok(()),
            (Ok(text), Expected::Output(want)) => {
                Err(format!("output differs\n--- expected\n{}--- got\n{}", want, text))
            }
            (Ok(_), Expected::Error(code)) => Err(format!("expected error {}, got output", code)),
            (Err(e), Expected::Error(code)) if e.code() == code => Ok(()),
            (Err(e), _) => Err(format!("unexpected error {}: {}", e.code(), e)),
        }
    }
}

/// Find a fixture by name
pub fn find(name: &str) -> Option<Fixture> {
    all().into_iter().find(|f| f.name == name)
}

/// Run every fixture, in order
pub fn run_all() -> Vec<(&'static str, Result<(), String>)> {
    all().into_iter().map(|f| (f.name, f.run())).collect()
}

pub fn all() -> Vec<Fixture> {
    vec![
        Fixture {
            name: "mutable_int",
            resolve: true,
            build: mutable_int,
            expected: Expected::Output("int x = 5;\n\n"),
        },
        Fixture {
            name: "struct_point",
            resolve: true,
            build: struct_point,
            expected: Expected::Output("struct Point {\n    int x;\n    int y;\n};\n\n"),
        },
        Fixture {
            name: "self_reference",
            resolve: true,
            build: self_reference,
            expected: Expected::Error("E0105"),
        },
        Fixture {
            name: "block_statements",
            resolve: true,
            build: block_statements,
            expected: Expected::Output(
                "int a;\n\nint b;\n\nvoid reset() {\n    a = 1;\n    b = 2;\n}\n\n",
            ),
        },
        Fixture {
            name: "inferred_function",
            resolve: true,
            build: inferred_function,
            expected: Expected::Output("int f() {\n    return 1;\n}\n\n"),
        },
        Fixture {
            name: "linked_list",
            resolve: true,
            build: linked_list,
            expected: Expected::Output(LINKED_LIST),
        },
        Fixture {
            name: "union_and_enum",
            resolve: false,
            build: union_and_enum,
            expected: Expected::Output(UNION_AND_ENUM),
        },
        Fixture {
            name: "collatz",
            resolve: true,
            build: collatz,
            expected: Expected::Output(COLLATZ),
        },
        Fixture {
            name: "linear_search",
            resolve: true,
            build: linear_search,
            expected: Expected::Output(LINEAR_SEARCH),
        },
        Fixture {
            name: "arrays_and_casts",
            resolve: true,
            build: arrays_and_casts,
            expected: Expected::Output(ARRAYS_AND_CASTS),
        },
        Fixture {
            name: "duplicate_declaration",
            resolve: true,
            build: duplicate_declaration,
            expected: Expected::Error("E0101"),
        },
        Fixture {
            name: "duplicate_member",
            resolve: true,
            build: duplicate_member,
            expected: Expected::Error("E0102"),
        },
        Fixture {
            name: "unknown_type",
            resolve: true,
            build: unknown_type,
            expected: Expected::Error("E0103"),
        },
        Fixture {
            name: "variable_as_type",
            resolve: true,
            build: variable_as_type,
            expected: Expected::Error("E0104"),
        },
        Fixture {
            name: "mutual_cycle",
            resolve: true,
            build: mutual_cycle,
            expected: Expected::Error("E0105"),
        },
        Fixture {
            name: "sum_type",
            resolve: true,
            build: sum_type,
            expected: Expected::Error("E0106"),
        },
        Fixture {
            name: "for_each",
            resolve: true,
            build: for_each_loop,
            expected: Expected::Error("E0201"),
        },
        Fixture {
            name: "match_scope",
            resolve: true,
            build: match_on_shape,
            expected: Expected::Error("E0201"),
        },
    ]
}

// ==================== Trees ====================

fn mutable_int() -> SourceFile {
    let mut b = SourceFileBuilder::new();
    b.item(mutable("x", int(), Some(int_lit(5))));
    b.finish()
}

fn struct_point() -> SourceFile {
    let mut b = SourceFileBuilder::new();
    b.item(structure("Point", vec![("x", int()), ("y", int())]));
    b.finish()
}

fn self_reference() -> SourceFile {
    let mut b = SourceFileBuilder::new();
    b.item(structure("Node", vec![("next", named("Node"))]));
    b.finish()
}

fn block_statements() -> SourceFile {
    let mut b = SourceFileBuilder::new();
    b.item(mutable("a", int(), None));
    b.item(mutable("b", int(), None));
    b.item(function(
        "reset",
        vec![],
        prim(PrimitiveType::Void),
        block(vec![
            stmt(assign(AssignOp::Assign, id("a"), int_lit(1))),
            stmt(assign(AssignOp::Assign, id("b"), int_lit(2))),
        ]),
    ));
    b.finish()
}

fn inferred_function() -> SourceFile {
    let mut b = SourceFileBuilder::new();
    b.item(function("f", vec![], int(), block(vec![stmt(ret(Some(int_lit(1))))])));
    b.finish()
}

const LINKED_LIST: &str = "\
struct Node {
    long long value;
    struct Node * next;
};

long long total(struct Node * head) {
    long long sum = 0LL;
    while (head) {
        sum += (*head).value;
        head = (*head).next;
    }

    return sum;
}

";

fn linked_list() -> SourceFile {
    let mut b = SourceFileBuilder::new();
    let i64_ty = || prim(PrimitiveType::I64);
    b.item(structure("Node", vec![("value", i64_ty()), ("next", nullable(named("Node")))]));
    let sum = b.local(mutable("sum", i64_ty(), Some(lit(LiteralValue::I64(0)))));
    let node = || paren(unary(UnOp::Deref, id("head")));
    b.item(function(
        "total",
        vec![("head", nullable(named("Node")))],
        i64_ty(),
        block(vec![
            stmt(decl_stmt(sum)),
            while_loop(
                id("head"),
                block(vec![
                    stmt(assign(AssignOp::AddAssign, id("sum"), field(node(), "value"))),
                    stmt(assign(AssignOp::Assign, id("head"), field(node(), "next"))),
                ]),
            ),
            stmt(ret(Some(id("sum")))),
        ]),
    ));
    b.finish()
}

const UNION_AND_ENUM: &str = "\
union Number {
    long long i;
    double f;
};

enum Color {
    Red,
    Green,
    Blue
};

";

fn union_and_enum() -> SourceFile {
    let mut b = SourceFileBuilder::new();
    b.item(union("Number", vec![("i", prim(PrimitiveType::I64)), ("f", prim(PrimitiveType::F64))]));
    b.item(enumeration("Color", &["Red", "Green", "Blue"]));
    b.finish()
}

const COLLATZ: &str = "\
int collatz(int n) {
    int steps = 0;
    while (n != 1) {
        if (n % 2 == 0) {
            n /= 2;
        }

        else
            n = 3 * n + 1;
        ++steps;
    }

    return steps;
}

";

fn collatz() -> SourceFile {
    let mut b = SourceFileBuilder::new();
    let steps = b.local(mutable("steps", int(), Some(int_lit(0))));
    b.item(function(
        "collatz",
        vec![("n", int())],
        int(),
        block(vec![
            stmt(decl_stmt(steps)),
            while_loop(
                binary(id("n"), BinOp::Ne, int_lit(1)),
                block(vec![
                    if_else(
                        binary(binary(id("n"), BinOp::Mod, int_lit(2)), BinOp::Eq, int_lit(0)),
                        stmt(assign(AssignOp::DivAssign, id("n"), int_lit(2))),
                        Some(stmt(assign(
                            AssignOp::Assign,
                            id("n"),
                            binary(binary(int_lit(3), BinOp::Mul, id("n")), BinOp::Add, int_lit(1)),
                        ))),
                    ),
                    stmt(increment(id("steps"))),
                ]),
            ),
            stmt(ret(Some(id("steps")))),
        ]),
    ));
    b.finish()
}

const LINEAR_SEARCH: &str = "\
int find(int * xs, int n, int key) {
    for (int i = 0; i < n; ++i) {
        if (xs[i] == key) {
            return i;
        }

    }

    goto missing;
    missing:;
    return -1;
}

";

fn linear_search() -> SourceFile {
    let mut b = SourceFileBuilder::new();
    let i = b.local(mutable("i", int(), Some(int_lit(0))));
    b.item(function(
        "find",
        vec![("xs", ptr(int())), ("n", int()), ("key", int())],
        int(),
        block(vec![
            for_loop(
                decl_stmt(i),
                binary(id("i"), BinOp::Lt, id("n")),
                increment(id("i")),
                block(vec![if_else(
                    binary(index(id("xs"), id("i")), BinOp::Eq, id("key")),
                    block(vec![stmt(ret(Some(id("i"))))]),
                    None,
                )]),
            ),
            stmt(goto("missing")),
            stmt(label("missing")),
            stmt(ret(Some(unary(UnOp::Neg, int_lit(1))))),
        ]),
    ));
    b.finish()
}

const ARRAYS_AND_CASTS: &str = "\
int primes[4] = {2, 3, 5, 7};

int verbose = 1;

char lower(int x) {
    --x;
    return (char)x;
}

";

fn arrays_and_casts() -> SourceFile {
    let mut b = SourceFileBuilder::new();
    b.item(mutable(
        "primes",
        array(int()),
        Some(array_lit(
            Some(int_lit(4)),
            int(),
            vec![int_lit(2), int_lit(3), int_lit(5), int_lit(7)],
        )),
    ));
    b.item(mutable("verbose", prim(PrimitiveType::Bool), Some(boolean(true))));
    b.item(function(
        "lower",
        vec![("x", int())],
        prim(PrimitiveType::Char),
        block(vec![
            stmt(decrement(id("x"))),
            stmt(ret(Some(cast(id("x"), prim(PrimitiveType::Char))))),
        ]),
    ));
    b.finish()
}

fn duplicate_declaration() -> SourceFile {
    let mut b = SourceFileBuilder::new();
    b.item(mutable("count", int(), None));
    b.item(structure("count", vec![("n", int())]));
    b.finish()
}

fn duplicate_member() -> SourceFile {
    let mut b = SourceFileBuilder::new();
    b.item(structure("Pair", vec![("a", int()), ("a", prim(PrimitiveType::F32))]));
    b.finish()
}

fn unknown_type() -> SourceFile {
    let mut b = SourceFileBuilder::new();
    b.item(mutable("p", named("Missing"), None));
    b.finish()
}

fn variable_as_type() -> SourceFile {
    let mut b = SourceFileBuilder::new();
    b.item(mutable("width", int(), Some(int_lit(80))));
    b.item(structure("Screen", vec![("w", named("width"))]));
    b.finish()
}

fn mutual_cycle() -> SourceFile {
    let mut b = SourceFileBuilder::new();
    b.item(structure("Even", vec![("next", named("Odd"))]));
    b.item(structure("Odd", vec![("next", named("Even"))]));
    b.finish()
}

fn sum_type() -> SourceFile {
    let mut b = SourceFileBuilder::new();
    b.item(sum("Shape", vec![("Circle", Some(prim(PrimitiveType::F64))), ("Empty", None)]));
    b.finish()
}

fn for_each_loop() -> SourceFile {
    let mut b = SourceFileBuilder::new();
    b.item(function(
        "print_all",
        vec![("xs", array(int()))],
        prim(PrimitiveType::Void),
        block(vec![for_each(
            "x",
            id("xs"),
            block(vec![stmt(Stmt::Expr(call(id("print"), vec![id("x")])))]),
        )]),
    ));
    b.finish()
}

fn match_on_shape() -> SourceFile {
    let mut b = SourceFileBuilder::new();
    b.item(function(
        "area",
        vec![("kind", int())],
        int(),
        block(vec![
            match_scope(
                id("kind"),
                vec![("Square", vec![stmt(ret(Some(int_lit(4))))]), ("Point", vec![])],
            ),
            stmt(ret(Some(int_lit(0)))),
        ]),
    ));
    b.finish()
}
