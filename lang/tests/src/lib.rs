pub mod utils {
    use hoist_lower::{LocalDeclarationsLowering, LowerConf, Result};
    use hoist_syntax::*;
    use hoist_utils::{arena::ArenaAssoc, pass::CompilerPass};

    pub fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    pub fn lower(program: &mut Program) -> Result<ArenaAssoc<DeclId, Vec<DeclId>>> {
        lower_with(program, &LowerConf::default())
    }

    pub fn lower_with(program: &mut Program, conf: &LowerConf) -> Result<ArenaAssoc<DeclId, Vec<DeclId>>> {
        init_logger();
        LocalDeclarationsLowering::new(program, conf).run(())
    }

    pub fn render(program: &Program) -> String {
        let fmt = Formatter::new(program);
        Formatter::render(program.pretty(&fmt))
    }
}

/// Hand-built programs with local declarations.
pub mod fixtures {
    use hoist_syntax::*;

    /// The handles a test needs besides the program.
    pub struct Fixture {
        pub program: Program,
        pub root: DeclId,
        pub locals: Vec<DeclId>,
    }

    /// ```text
    /// fun outer(n: Int): Int {
    ///   fun inner(k: Int): Int { return n + k }
    ///   return inner(2)
    /// }
    /// ```
    pub fn captured_call() -> Fixture {
        let mut p = Program::new();
        let outer = p.function(None, Name::ident("outer"), Type::Int);
        let n = p.param(outer, Name::ident("n"), Type::Int);
        let inner = p.function(Some(outer), Name::ident("inner"), Type::Int);
        let k = p.param(inner, Name::ident("k"), Type::Int);
        let read_n = p.get(n);
        let read_k = p.get(k);
        let sum = p.binary(BinOp::Add, read_n, read_k);
        let ret = p.ret(inner, sum);
        let inner_body = p.block([ret]);
        p.set_body(inner, inner_body);
        let decl = p.local(inner);
        let two = p.int(2);
        let call = p.call(inner, [two]);
        let ret = p.ret(outer, call);
        let body = p.block([decl, ret]);
        p.set_body(outer, body);
        Fixture { program: p, root: outer, locals: vec![inner] }
    }

    /// ```text
    /// fun outer(n: Int): Int {
    ///   fun a(): Int {
    ///     fun b(): Int { return n }
    ///     return b()
    ///   }
    ///   return a()
    /// }
    /// ```
    pub fn transitive() -> Fixture {
        let mut p = Program::new();
        let outer = p.function(None, Name::ident("outer"), Type::Int);
        let n = p.param(outer, Name::ident("n"), Type::Int);
        let a = p.function(Some(outer), Name::ident("a"), Type::Int);
        let b = p.function(Some(a), Name::ident("b"), Type::Int);
        let read = p.get(n);
        let ret = p.ret(b, read);
        let b_body = p.block([ret]);
        p.set_body(b, b_body);
        let b_decl = p.local(b);
        let call_b = p.call(b, []);
        let ret = p.ret(a, call_b);
        let a_body = p.block([b_decl, ret]);
        p.set_body(a, a_body);
        let a_decl = p.local(a);
        let call_a = p.call(a, []);
        let ret = p.ret(outer, call_a);
        let body = p.block([a_decl, ret]);
        p.set_body(outer, body);
        Fixture { program: p, root: outer, locals: vec![a, b] }
    }

    /// ```text
    /// fun make(n: Int): Int {
    ///   val o = object { fun get(): Int = n }
    ///   return o.get()
    /// }
    /// ```
    pub fn anonymous_object() -> Fixture {
        let mut p = Program::new();
        let make = p.function(None, Name::ident("make"), Type::Int);
        let n = p.param(make, Name::ident("n"), Type::Int);
        let obj = p.object(make);
        let ctor = p.constructor(obj, true);
        let get = p.function(Some(obj), Name::ident("get"), Type::Int);
        let read = p.get(n);
        let ret = p.ret(get, read);
        let get_body = p.block([ret]);
        p.set_body(get, get_body);
        let decl = p.local(obj);
        let instance = p.instantiate(ctor, []);
        let call = p.call_on(instance, get, []);
        let ret = p.ret(make, call);
        let body = p.block([decl, ret]);
        p.set_body(make, body);
        Fixture { program: p, root: make, locals: vec![obj] }
    }

    /// ```text
    /// fun f() {
    ///   class L {
    ///     inner class I { constructor() { this@L } }
    ///   }
    /// }
    /// ```
    pub fn inner_class_in_local_class() -> Fixture {
        let mut p = Program::new();
        let f = p.function(None, Name::ident("f"), Type::Unit);
        let local = p.class(Some(f), Name::ident("L"), ClassKind::Class);
        p.constructor(local, true);
        let inner = p.inner_class(local, Name::ident("I"));
        let ctor = p.constructor(inner, true);
        let outer_this = p.decls[&local].as_class().map(|class| class.this).unwrap();
        let read = p.get(outer_this);
        let ctor_body = p.block([read]);
        p.set_body(ctor, ctor_body);
        let decl = p.local(local);
        let body = p.block([decl]);
        p.set_body(f, body);
        Fixture { program: p, root: f, locals: vec![local, inner, ctor] }
    }

    /// ```text
    /// fun outer(n: Int): Int {
    ///   fun g(): Int { return n }
    ///   fun h(): Int { return g() }
    ///   return h()
    /// }
    /// ```
    pub fn sibling_call() -> Fixture {
        let mut p = Program::new();
        let outer = p.function(None, Name::ident("outer"), Type::Int);
        let n = p.param(outer, Name::ident("n"), Type::Int);
        let g = p.function(Some(outer), Name::ident("g"), Type::Int);
        let read = p.get(n);
        let ret = p.ret(g, read);
        let g_body = p.block([ret]);
        p.set_body(g, g_body);
        let h = p.function(Some(outer), Name::ident("h"), Type::Int);
        let call_g = p.call(g, []);
        let ret = p.ret(h, call_g);
        let h_body = p.block([ret]);
        p.set_body(h, h_body);
        let g_decl = p.local(g);
        let h_decl = p.local(h);
        let call_h = p.call(h, []);
        let ret = p.ret(outer, call_h);
        let body = p.block([g_decl, h_decl, ret]);
        p.set_body(outer, body);
        Fixture { program: p, root: outer, locals: vec![g, h] }
    }

    /// ```text
    /// fun outer(n: Int) {
    ///   fun a() {
    ///     val l = { return@a n }
    ///     ::l
    ///   }
    ///   a()
    /// }
    /// ```
    pub fn nonlocal_return_in_lambda() -> Fixture {
        let mut p = Program::new();
        let outer = p.function(None, Name::ident("outer"), Type::Unit);
        let n = p.param(outer, Name::ident("n"), Type::Int);
        let a = p.function(Some(outer), Name::ident("a"), Type::Unit);
        let lambda = p.lambda(a, Type::Int);
        let read = p.get(n);
        let ret = p.ret(a, read);
        let lambda_body = p.block([ret]);
        p.set_body(lambda, lambda_body);
        let lambda_decl = p.local(lambda);
        let reference = p.callable_ref(lambda, Vec::new());
        let a_body = p.block([lambda_decl, reference]);
        p.set_body(a, a_body);
        let a_decl = p.local(a);
        let call = p.call(a, []);
        let body = p.block([a_decl, call]);
        p.set_body(outer, body);
        Fixture { program: p, root: outer, locals: vec![a, lambda] }
    }

    /// ```text
    /// fun plain(n: Int): Int { return n }
    /// ```
    pub fn plain() -> Fixture {
        let mut p = Program::new();
        let plain = p.function(None, Name::ident("plain"), Type::Int);
        let n = p.param(plain, Name::ident("n"), Type::Int);
        let read = p.get(n);
        let ret = p.ret(plain, read);
        let body = p.block([ret]);
        p.set_body(plain, body);
        Fixture { program: p, root: plain, locals: Vec::new() }
    }

    /// ```text
    /// fun outer(n: Int, m: Int): Int {
    ///   val twice = { n + n }
    ///   return twice()
    /// }
    /// ```
    pub fn lambda_reading_one_of_two() -> Fixture {
        let mut p = Program::new();
        let outer = p.function(None, Name::ident("outer"), Type::Int);
        let n = p.param(outer, Name::ident("n"), Type::Int);
        p.param(outer, Name::ident("m"), Type::Int);
        let lambda = p.lambda(outer, Type::Int);
        let lhs = p.get(n);
        let rhs = p.get(n);
        let sum = p.binary(BinOp::Add, lhs, rhs);
        let ret = p.ret(lambda, sum);
        let lambda_body = p.block([ret]);
        p.set_body(lambda, lambda_body);
        let decl = p.local(lambda);
        let call = p.call(lambda, []);
        let ret = p.ret(outer, call);
        let body = p.block([decl, ret]);
        p.set_body(outer, body);
        Fixture { program: p, root: outer, locals: vec![lambda] }
    }

    /// ```text
    /// class Box(val v: Int) {
    ///   fun shifted(d: Int): Int {
    ///     fun String.plus(): Int { return d + this@Box.v }
    ///     return "".plus()
    ///   }
    /// }
    /// ```
    pub fn extension_in_member() -> Fixture {
        let mut p = Program::new();
        let boxed = p.class(None, Name::ident("Box"), ClassKind::Class);
        p.constructor(boxed, true);
        let v = p.field(boxed, Name::ident("v"), Type::Int, None);
        let shifted = p.function(Some(boxed), Name::ident("shifted"), Type::Int);
        let d = p.param(shifted, Name::ident("d"), Type::Int);
        let this = p.decls[&boxed].as_class().map(|class| class.this).unwrap();

        let plus = p.function(Some(shifted), Name::ident("plus"), Type::Int);
        p.extension_receiver(plus, Type::Str);
        let read_d = p.get(d);
        let receiver = p.get(this);
        let read_v = p.get_field(v, Some(receiver));
        let sum = p.binary(BinOp::Add, read_d, read_v);
        let ret = p.ret(plus, sum);
        let plus_body = p.block([ret]);
        p.set_body(plus, plus_body);

        let decl = p.local(plus);
        let empty = p.expr(Literal::Str(String::new()));
        let call = p.expr(Call(MemberAccess {
            callee: plus,
            type_args: Vec::new(),
            dispatch: None,
            extension: Some(empty),
            args: Vec::new(),
        }));
        let ret = p.ret(shifted, call);
        let body = p.block([decl, ret]);
        p.set_body(shifted, body);
        Fixture { program: p, root: shifted, locals: vec![plus] }
    }
}
