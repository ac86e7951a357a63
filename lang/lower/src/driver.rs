use crate::{
    closure::ClosureAnalyzer, collect::LocalDeclarations, conf::LowerConf, err::*,
    rewrite::rewrite_declarations, transform::DescriptorTransformer, validate::IrValidator,
};
use hoist_syntax::*;
use hoist_utils::{arena::ArenaAssoc, pass::CompilerPass};

/// The states a root goes through; a root without local declarations stops after `Collected`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Collected,
    ClosuresComputed,
    DescriptorsTransformed,
    BodiesRewritten,
    Spliced,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            | Stage::Collected => "collected",
            | Stage::ClosuresComputed => "closures computed",
            | Stage::DescriptorsTransformed => "descriptors transformed",
            | Stage::BodiesRewritten => "bodies rewritten",
            | Stage::Spliced => "spliced",
        };
        write!(f, "{}", s)
    }
}

/// Lifts every local function and class next to the declaration it was found in.
pub struct LocalDeclarationsLowering<'a> {
    pub program: &'a mut Program,
    pub conf: &'a LowerConf,
}

impl AsRef<Program> for LocalDeclarationsLowering<'_> {
    fn as_ref(&self) -> &Program {
        self.program
    }
}
impl AsMut<Program> for LocalDeclarationsLowering<'_> {
    fn as_mut(&mut self) -> &mut Program {
        self.program
    }
}

impl CompilerPass for LocalDeclarationsLowering<'_> {
    type Arena = Program;
    type Input = ();
    /// the lifted siblings of every root that had local declarations
    type Output = ArenaAssoc<DeclId, Vec<DeclId>>;
    type Error = LowerError;

    fn run(mut self, (): ()) -> Result<Self::Output> {
        let mut lifted = ArenaAssoc::new();
        for container in self.containers() {
            self.lower_container(container, &mut lifted)?;
        }
        if self.conf.validate {
            IrValidator::new(self.program).check()?;
        }
        Ok(lifted)
    }
}

impl<'a> LocalDeclarationsLowering<'a> {
    pub fn new(program: &'a mut Program, conf: &'a LowerConf) -> Self {
        Self { program, conf }
    }

    /// Every class reachable from the module through class members, nested ones first,
    /// and the module itself last.
    fn containers(&self) -> Vec<Option<DeclId>> {
        fn classes(program: &Program, decl: DeclId, out: &mut Vec<Option<DeclId>>) {
            if let Some(class) = program.decls[&decl].as_class() {
                for member in &class.members {
                    classes(program, *member, out);
                }
                out.push(Some(decl));
            }
        }
        let mut containers = Vec::new();
        for decl in &self.program.top {
            classes(self.program, *decl, &mut containers);
        }
        containers.push(None);
        containers
    }

    /// Functions and constructors listed by the container, and accessors of its properties.
    fn roots(&self, container: Option<DeclId>) -> Vec<DeclId> {
        let mut roots = Vec::new();
        for child in self.program.children(container) {
            match &self.program.decls[child] {
                | Declaration::Function(_) | Declaration::Constructor(_) => roots.push(*child),
                | Declaration::Property(Property { getter, setter, .. }) => {
                    roots.extend(getter.iter().chain(setter));
                }
                | Declaration::Class(_) | Declaration::Field(_) => {}
            }
        }
        roots
    }

    pub fn lower_container(
        &mut self, container: Option<DeclId>, lifted: &mut ArenaAssoc<DeclId, Vec<DeclId>>,
    ) -> Result<()> {
        // whoever lowers the enclosing callable handles everything inside it
        if container.is_some_and(|decl| self.program.is_local(decl)) {
            return Ok(());
        }
        for root in self.roots(container) {
            if let Some(siblings) = self.lower_root(root)? {
                self.splice(container, root, &siblings)?;
                self.enter(root, Stage::Spliced);
                self.log_pretty("lowered", root);
                lifted.insert(root, siblings);
            }
        }
        Ok(())
    }

    /// Lift everything declared below `root`; `None` if there is nothing to lift.
    pub fn lower_root(&mut self, root: DeclId) -> Result<Option<Vec<DeclId>>> {
        let locals = LocalDeclarations::collect(self.program, root)?;
        if locals.is_empty() {
            return Ok(None);
        }
        self.enter(root, Stage::Collected);

        let closures = ClosureAnalyzer::new(self.program).analyze(root);
        self.enter(root, Stage::ClosuresComputed);

        let transformed = DescriptorTransformer::new(self.program, self.conf, root, &locals, &closures).run()?;
        self.enter(root, Stage::DescriptorsTransformed);

        rewrite_declarations(self.program, root, &locals, &transformed)?;
        self.enter(root, Stage::BodiesRewritten);

        let mut siblings = Vec::with_capacity(locals.functions.len() + locals.classes.len());
        for old in locals.functions.keys().chain(locals.classes.keys()) {
            let new = transformed.lifted(*old)?;
            self.log_ugly("lifted", new);
            siblings.push(new);
        }
        Ok(Some(siblings))
    }

    /// Place the siblings right after the root, or after the property of an accessor root.
    fn splice(&mut self, container: Option<DeclId>, root: DeclId, siblings: &[DeclId]) -> Result<()> {
        let anchor = (self.program.decls[&root].as_function())
            .and_then(|func| func.accessor_of)
            .unwrap_or(root);
        let Some(children) = self.program.children_mut(container) else {
            return Err(LowerError::invariant("container lists no declarations", root));
        };
        let Some(position) = children.iter().position(|child| *child == anchor) else {
            return Err(LowerError::invariant("root is not listed by its container", root));
        };
        children.splice(position + 1..position + 1, siblings.iter().copied());
        Ok(())
    }

    fn enter(&self, root: DeclId, stage: Stage) {
        log::debug!("[{}] {}", stage, self.program.decls[&root].name());
    }
}
