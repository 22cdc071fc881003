use std::{collections::HashMap, io, path::Path as FsPath};

use crate::{
    dictionary::{DictKey, DictObject, DictStack, SavedState, StackDict},
    error::{ErrorKind, PostScriptError, PostScriptResult},
    font::{self, FontObject},
    graphics::GraphicsContext,
    matrix::Matrix,
    object::{
        check_object_size, AllocMode, Arena, ArrayIndex, ArrayKind, ArrayObject, DictIndex,
        FontIndex, Mark, Name, Object, SaveIndex, StringIndex, StringKind, StringObject,
    },
    operator::{self, OpKind, Operator},
    scanner::{Scanner, Token},
    stack::OperandStack,
};

/// Page region declared by a `%%BoundingBox:` comment encountered during
/// interpretation
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Identity maps threaded through a deep clone so aliased composites stay
/// aliased and cyclic structures terminate
#[derive(Default)]
struct CloneMap {
    arrays: HashMap<ArrayIndex, ArrayIndex>,
    dicts: HashMap<DictIndex, DictIndex>,
}

/// The PostScript virtual machine: operand and dictionary stacks, the
/// composite-object arenas, and the graphics state.
pub(crate) struct Interpreter {
    operand_stack: OperandStack,
    dict_stack: DictStack,
    strings: Arena<StringIndex, StringObject>,
    arrays: Arena<ArrayIndex, ArrayObject>,
    dictionaries: Arena<DictIndex, DictObject>,
    fonts: Arena<FontIndex, FontObject>,
    saves: Arena<SaveIndex, SavedState>,
    graphics: GraphicsContext,

    /// Depth of `{ ... }` nesting while scanning; names seen inside a
    /// procedure body are deferred instead of executed
    procedure_depth: u32,

    /// Monotonic counter identifying the innermost active loop; `exit`
    /// decrements it so that only that loop terminates
    loop_count: i32,

    quit: bool,
    alloc_mode: AllocMode,
    rand_state: u32,
    rand_seed: u32,
    bounding_box: Option<BoundingBox>,

    /// Name of the operator currently executing, for error attribution
    current_op: &'static str,
}

fn system_lookup(name: &[u8]) -> Option<Object> {
    if let Some(op) = operator::lookup(name) {
        return Some(Object::Operator(op));
    }

    match name {
        b"true" => Some(Object::Bool(true)),
        b"false" => Some(Object::Bool(false)),
        b"null" => Some(Object::Null),
        _ => None,
    }
}

fn format_real(v: f64) -> String {
    let mut s = format!("{:.6}", v);

    while s.ends_with('0') && !s.ends_with(".0") {
        s.pop();
    }

    s
}

impl Interpreter {
    pub fn new(width: f64, height: f64) -> Self {
        let mut dictionaries = Arena::new();
        let local = dictionaries.insert(DictObject::new(0, AllocMode::Local));

        Self {
            operand_stack: OperandStack::new(),
            dict_stack: DictStack::new(local),
            strings: Arena::new(),
            arrays: Arena::new(),
            dictionaries,
            fonts: Arena::new(),
            saves: Arena::new(),
            graphics: GraphicsContext::new(width, height),
            procedure_depth: 0,
            loop_count: 0,
            quit: false,
            alloc_mode: AllocMode::Local,
            rand_state: 1,
            rand_seed: 1,
            bounding_box: None,
            current_op: "exec",
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    /// Interactive mode keeps going after an error; the quit flag must
    /// not survive the failed token
    pub fn reset_after_error(&mut self) {
        self.quit = false;
    }

    pub fn graphics(&self) -> &GraphicsContext {
        &self.graphics
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.bounding_box
    }

    pub fn save_file(&mut self, path: &FsPath) -> io::Result<()> {
        self.graphics.save_file(path)
    }

    fn in_procedure(&self) -> bool {
        self.procedure_depth > 0
    }

    // error helpers

    fn err(&self, kind: ErrorKind) -> anyhow::Error {
        PostScriptError::new(kind, self.current_op).into()
    }

    fn err_detail(&self, kind: ErrorKind, detail: impl Into<String>) -> anyhow::Error {
        PostScriptError::with_detail(kind, self.current_op, detail).into()
    }

    fn typecheck(&self) -> anyhow::Error {
        self.err(ErrorKind::TypeCheck)
    }

    // operand stack helpers

    fn push(&mut self, obj: Object) -> PostScriptResult<()> {
        if self.operand_stack.push(obj) {
            Ok(())
        } else {
            Err(self.err(ErrorKind::StackOverflow))
        }
    }

    fn push_number(&mut self, value: f64, real: bool) -> PostScriptResult<()> {
        let fits_int = !real
            && value.fract() == 0.0
            && value >= f64::from(i32::MIN)
            && value <= f64::from(i32::MAX);

        if fits_int {
            self.push(Object::Integer(value as i32))
        } else {
            self.push(Object::Real(value))
        }
    }

    /// Integer results stay integers while they fit; otherwise they
    /// spill into a real
    fn push_integer_result(&mut self, value: i64) -> PostScriptResult<()> {
        match i32::try_from(value) {
            Ok(v) => self.push(Object::Integer(v)),
            Err(_) => self.push(Object::Real(value as f64)),
        }
    }

    fn pop(&mut self) -> PostScriptResult<Object> {
        match self.operand_stack.pop() {
            Some(obj) => Ok(obj),
            None => Err(self.err(ErrorKind::StackUnderflow)),
        }
    }

    fn pop_n(&mut self, n: usize) -> PostScriptResult<()> {
        if self.operand_stack.pop_n(n) {
            Ok(())
        } else {
            Err(self.err(ErrorKind::StackUnderflow))
        }
    }

    fn peek(&self, depth: usize) -> PostScriptResult<&Object> {
        match self.operand_stack.peek(depth) {
            Some(obj) => Ok(obj),
            None => Err(self.err(ErrorKind::StackUnderflow)),
        }
    }

    fn peek_number(&self, depth: usize) -> PostScriptResult<f64> {
        match self.peek(depth)?.as_number() {
            Some(v) => Ok(v),
            None => Err(self.typecheck()),
        }
    }

    fn pop_number(&mut self) -> PostScriptResult<f64> {
        match self.pop()?.as_number() {
            Some(v) => Ok(v),
            None => Err(self.typecheck()),
        }
    }

    fn pop_integer(&mut self) -> PostScriptResult<i32> {
        match self.pop()? {
            Object::Integer(n) => Ok(n),
            _ => Err(self.typecheck()),
        }
    }

    fn pop_bool(&mut self) -> PostScriptResult<bool> {
        match self.pop()? {
            Object::Bool(b) => Ok(b),
            _ => Err(self.typecheck()),
        }
    }

    /// Raw bytes of a string-typed value: a literal name or a text/hex
    /// string
    fn string_type_bytes(&self, obj: &Object) -> Option<Vec<u8>> {
        match obj {
            Object::Literal(name) => Some(name.as_bytes().to_vec()),
            Object::String(idx) => Some(self.strings.get(*idx).as_bytes().to_vec()),
            _ => None,
        }
    }

    /// Resolves an object into a dictionary key, or `None` for types that
    /// cannot key a dictionary
    fn dict_key(&self, obj: &Object) -> Option<DictKey> {
        match obj {
            Object::Literal(name) => Some(DictKey::Str(name.as_bytes().to_vec())),
            Object::String(idx) => Some(DictKey::Str(self.strings.get(*idx).as_bytes().to_vec())),
            _ => DictKey::from_scalar(obj),
        }
    }

    // token dispatch

    pub fn process_token(&mut self, scanner: &mut Scanner, token: Token) -> PostScriptResult<()> {
        match token {
            Token::ArrayOpen => self.push(Object::Mark(Mark::ArrayOpen)),
            Token::DictOpen => self.push(Object::Mark(Mark::DictOpen)),
            Token::ArrayClose => {
                if self.in_procedure() {
                    self.push(Object::Mark(Mark::ArrayClose))
                } else {
                    self.build_array(ArrayKind::Array)
                }
            }
            Token::DictClose => {
                if self.in_procedure() {
                    self.push(Object::Mark(Mark::DictClose))
                } else {
                    self.build_dictionary()
                }
            }
            Token::ProcedureOpen => {
                self.procedure_depth += 1;
                self.push(Object::Mark(Mark::ProcedureOpen))
            }
            Token::ProcedureClose => {
                self.build_array(ArrayKind::Procedure)?;
                self.procedure_depth = self.procedure_depth.saturating_sub(1);
                Ok(())
            }
            Token::Number { value, real } => self.push_number(value, real),
            Token::TextString(bytes) => {
                let idx = self
                    .strings
                    .insert(StringObject::from_bytes(bytes, StringKind::Text));
                self.push(Object::String(idx))
            }
            Token::HexString(bytes) => {
                let idx = self
                    .strings
                    .insert(StringObject::from_bytes(bytes, StringKind::Hex));
                self.push(Object::String(idx))
            }
            Token::Literal(bytes) => self.push(Object::Literal(Name::from_bytes(bytes))),
            Token::Name(bytes) => self.resolve_name(scanner, &bytes, false),
            Token::Constant(bytes) => self.resolve_name(scanner, &bytes, true),
            Token::Dsc(text) => self.read_dsc(&text),
        }
    }

    /// Executable-name resolution. Names scanned inside a procedure body
    /// are deferred; constants (`//name`) always resolve immediately.
    fn resolve_name(
        &mut self,
        scanner: &mut Scanner,
        name: &[u8],
        constant: bool,
    ) -> PostScriptResult<()> {
        if !constant && self.in_procedure() {
            return self.push(Object::Name(Name::from_bytes(name.to_vec())));
        }

        match self.lookup_name(name) {
            Some(Object::Procedure(idx)) => self.execute_procedure(scanner, idx),
            Some(Object::Operator(op)) => self.execute_operator(scanner, op),
            Some(value) => self.push(value),
            None => Err(PostScriptError::new(
                ErrorKind::Undefined,
                String::from_utf8_lossy(name).into_owned(),
            )
            .into()),
        }
    }

    /// Dictionary-stack lookup by executable name, falling back to the
    /// system dictionary
    fn lookup_name(&self, name: &[u8]) -> Option<Object> {
        for scope in self.dict_stack.scopes() {
            match scope {
                StackDict::User(idx) => {
                    if let Some(value) = self.dictionaries.get(idx).get_name(name) {
                        return Some(value.clone());
                    }
                }
                StackDict::System => {
                    if let Some(value) = system_lookup(name) {
                        return Some(value);
                    }
                }
            }
        }

        system_lookup(name)
    }

    /// Dictionary-stack lookup by arbitrary key, as used by `load`
    fn find_by_key(&self, key: &Object) -> Option<Object> {
        for scope in self.dict_stack.scopes() {
            match scope {
                StackDict::User(idx) => {
                    if let Some(dict_key) = self.dict_key(key) {
                        if let Some(value) = self.dictionaries.get(idx).get(&dict_key) {
                            return Some(value.clone());
                        }
                    }
                }
                StackDict::System => {
                    if let Some(bytes) = self.string_type_bytes(key) {
                        if let Some(value) = system_lookup(&bytes) {
                            return Some(value);
                        }
                    }
                }
            }
        }

        None
    }

    fn execute_procedure(
        &mut self,
        scanner: &mut Scanner,
        proc: ArrayIndex,
    ) -> PostScriptResult<()> {
        let body = self.arrays.get(proc).as_slice().to_vec();

        for element in body {
            match element {
                Object::Name(name) => self.resolve_name(scanner, name.as_bytes(), false)?,
                Object::Operator(op) => self.execute_operator(scanner, op)?,
                // composite literals embedded in the body close here
                Object::Mark(Mark::ArrayClose) => self.build_array(ArrayKind::Array)?,
                Object::Mark(Mark::DictClose) => self.build_dictionary()?,
                element => self.push(element)?,
            }
        }

        Ok(())
    }

    fn execute_operator(
        &mut self,
        scanner: &mut Scanner,
        op: &'static Operator,
    ) -> PostScriptResult<()> {
        let depth = self.operand_stack.len();

        if op.arity > 0 {
            if op.arity > depth {
                anyhow::bail!(PostScriptError::with_detail(
                    ErrorKind::StackUnderflow,
                    op.name,
                    format!("stack size: {}, required: {}", depth, op.arity),
                ));
            }

            if op.numeric {
                for i in 0..op.arity {
                    if !self.operand_stack.peek(i).unwrap().is_number() {
                        anyhow::bail!(PostScriptError::with_detail(
                            ErrorKind::TypeCheck,
                            op.name,
                            format!("operand {} is not numeric", i),
                        ));
                    }
                }
            }
        }

        self.current_op = op.name;

        self.dispatch(scanner, op.kind)
    }

    fn dispatch(&mut self, scanner: &mut Scanner, kind: OpKind) -> PostScriptResult<()> {
        match kind {
            OpKind::PrintTop | OpKind::PrintAndPop => self.print_top(),
            OpKind::Stack => self.print_stack_plain(),
            OpKind::PStack => self.print_stack(),

            OpKind::Abs
            | OpKind::Neg
            | OpKind::Ceiling
            | OpKind::Floor
            | OpKind::Round
            | OpKind::Truncate
            | OpKind::Sqrt
            | OpKind::Ln
            | OpKind::Log
            | OpKind::Sin
            | OpKind::Cos => self.math_unary(kind),

            OpKind::Add
            | OpKind::Sub
            | OpKind::Mul
            | OpKind::Div
            | OpKind::Idiv
            | OpKind::Mod
            | OpKind::Atan
            | OpKind::Exp => self.math_binary(kind),

            OpKind::Rand => self.rand(),
            OpKind::SRand => self.srand(),
            OpKind::RRand => self.rrand(),

            OpKind::And | OpKind::Or | OpKind::Xor => self.logic_binary(kind),
            OpKind::Not => self.logic_not(),
            OpKind::Bitshift => self.bitshift(),

            OpKind::Eq => self.eq(false),
            OpKind::Ne => self.eq(true),
            OpKind::Lt | OpKind::Le | OpKind::Gt | OpKind::Ge => self.compare(kind),

            OpKind::Dup => {
                let obj = self.peek(0)?.clone();
                self.push(obj)
            }
            OpKind::Exch => self.exch(),
            OpKind::Pop => self.pop().map(|_| ()),
            OpKind::Clear => {
                self.operand_stack.clear();
                Ok(())
            }
            OpKind::Mark => self.push(Object::Mark(Mark::ArrayOpen)),
            OpKind::Count => {
                let n = self.operand_stack.len();
                self.push_number(n as f64, false)
            }
            OpKind::CountToMark => self.count_to_mark(),
            OpKind::ClearToMark => self.clear_to_mark(),
            OpKind::Index => self.index(),
            OpKind::Copy => self.copy(),
            OpKind::Roll => self.roll(),
            OpKind::Array => self.array(),
            OpKind::Aload => self.aload(),
            OpKind::Astore => self.astore(),

            OpKind::Def => self.def(),
            OpKind::Begin => self.begin(),
            OpKind::End => self.end(),
            OpKind::Dict => self.dict(),
            OpKind::Load => self.load(),
            OpKind::CurrentDict => self.currentdict(),
            OpKind::Where => self.where_(),
            OpKind::Bind => self.bind(),
            OpKind::Get => self.get(),
            OpKind::Put => self.put(),
            OpKind::Length => self.length(),

            OpKind::Cvs => self.cvs(),
            OpKind::Cvx => self.cvx(),
            OpKind::String => self.string(),

            OpKind::Exec => self.exec(scanner),
            OpKind::If => self.if_op(scanner),
            OpKind::IfElse => self.ifelse(scanner),
            OpKind::Repeat => self.repeat(scanner),
            OpKind::For => self.for_op(scanner),
            OpKind::Exit => {
                if self.loop_count > 0 {
                    self.loop_count -= 1;
                }
                Ok(())
            }
            OpKind::Quit => {
                self.quit = true;
                Ok(())
            }
            OpKind::Start => Ok(()),
            OpKind::Token => self.token(scanner),
            OpKind::CurrentFile => self.push(Object::File),

            OpKind::Save => self.save(),
            OpKind::Restore => self.restore(),
            OpKind::SetGlobal => self.setglobal(),

            OpKind::LanguageLevel => self.push(Object::Integer(1)),
            OpKind::Product => self.push_text(b"eps2pdf"),
            OpKind::Version => self.push_text(env!("CARGO_PKG_VERSION").as_bytes()),
            OpKind::SetPageDevice => self.setpagedevice(),

            OpKind::NewPath => {
                self.graphics.newpath();
                Ok(())
            }
            OpKind::MoveTo => {
                let [x, y] = self.numeric_args()?;
                self.graphics.moveto(x, y);
                self.pop_n(2)
            }
            OpKind::LineTo => {
                let [x, y] = self.numeric_args()?;
                self.graphics.lineto(x, y)?;
                self.pop_n(2)
            }
            OpKind::CurveTo => {
                let [x1, y1, x2, y2, x3, y3] = self.numeric_args()?;
                self.graphics.curveto(x1, y1, x2, y2, x3, y3)?;
                self.pop_n(6)
            }
            OpKind::ClosePath => {
                self.graphics.closepath();
                Ok(())
            }
            OpKind::RMoveTo => {
                let [dx, dy] = self.numeric_args()?;
                self.graphics.rmoveto(dx, dy)?;
                self.pop_n(2)
            }
            OpKind::RLineTo => {
                let [dx, dy] = self.numeric_args()?;
                self.graphics.rlineto(dx, dy)?;
                self.pop_n(2)
            }
            OpKind::RCurveTo => {
                let [dx1, dy1, dx2, dy2, dx3, dy3] = self.numeric_args()?;
                self.graphics.rcurveto(dx1, dy1, dx2, dy2, dx3, dy3)?;
                self.pop_n(6)
            }
            OpKind::CurrentPoint => {
                let (x, y) = self.graphics.currentpoint()?;
                self.push(Object::Real(x))?;
                self.push(Object::Real(y))
            }
            OpKind::Arc => {
                let [xc, yc, r, a1, a2] = self.numeric_args()?;
                self.graphics.arc(xc, yc, r, a1, a2);
                self.pop_n(5)
            }
            OpKind::ArcN => {
                let [xc, yc, r, a1, a2] = self.numeric_args()?;
                self.graphics.arcn(xc, yc, r, a1, a2);
                self.pop_n(5)
            }
            OpKind::RectFill => {
                let [x, y, w, h] = self.numeric_args()?;
                self.graphics.rectfill(x, y, w, h);
                self.pop_n(4)
            }
            OpKind::RectStroke => {
                let [x, y, w, h] = self.numeric_args()?;
                self.graphics.rectstroke(x, y, w, h);
                self.pop_n(4)
            }
            OpKind::Stroke => {
                self.graphics.stroke();
                Ok(())
            }
            OpKind::Fill => {
                self.graphics.fill();
                Ok(())
            }
            OpKind::EoFill => {
                self.graphics.eofill();
                Ok(())
            }
            OpKind::Clip => {
                self.graphics.clip();
                Ok(())
            }
            OpKind::ClipPath => {
                self.graphics.clippath();
                Ok(())
            }
            OpKind::GSave => {
                self.graphics.gsave();
                Ok(())
            }
            OpKind::GRestore => {
                self.graphics.grestore();
                Ok(())
            }
            OpKind::ErasePage => {
                self.graphics.erasepage();
                Ok(())
            }
            OpKind::FlattenPath => {
                self.graphics.flattenpath();
                Ok(())
            }
            OpKind::ShowPage => {
                self.graphics.showpage();
                Ok(())
            }

            OpKind::SetLineWidth => {
                let v = self.peek_number(0)?;
                self.graphics.set_line_width(v);
                self.pop_n(1)
            }
            OpKind::SetLineCap => {
                let v = self.peek_integer(0)?;
                self.graphics.set_line_cap(v)?;
                self.pop_n(1)
            }
            OpKind::SetLineJoin => {
                let v = self.peek_integer(0)?;
                self.graphics.set_line_join(v)?;
                self.pop_n(1)
            }
            OpKind::SetMiterLimit => {
                let v = self.peek_number(0)?;
                self.graphics.set_miter_limit(v)?;
                self.pop_n(1)
            }
            OpKind::SetFlat => {
                let v = self.peek_number(0)?;
                self.graphics.set_flat(v);
                self.pop_n(1)
            }
            OpKind::SetDash => self.setdash(),
            OpKind::SetGray => {
                let v = self.peek_number(0)?;
                self.graphics.set_gray(v);
                self.pop_n(1)
            }
            OpKind::SetRgbColor => {
                let [r, g, b] = self.numeric_args()?;
                self.graphics.set_rgb(r, g, b);
                self.pop_n(3)
            }
            OpKind::SetCmykColor => {
                let [c, m, y, k] = self.numeric_args()?;
                self.graphics.set_cmyk(c, m, y, k);
                self.pop_n(4)
            }
            OpKind::CurrentFlat => {
                let v = self.graphics.flat();
                self.push(Object::Real(v))
            }
            OpKind::CurrentLineWidth => {
                let v = self.graphics.line_width();
                self.push(Object::Real(v))
            }
            OpKind::CurrentLineCap => {
                let v = self.graphics.line_cap();
                self.push(Object::Integer(v))
            }
            OpKind::CurrentLineJoin => {
                let v = self.graphics.line_join();
                self.push(Object::Integer(v))
            }
            OpKind::CurrentMiterLimit => {
                let v = self.graphics.miter_limit();
                self.push(Object::Real(v))
            }
            OpKind::CurrentGray => {
                let v = self.graphics.color().to_gray();
                self.push(Object::Real(v))
            }
            OpKind::CurrentRgbColor => {
                let (r, g, b) = self.graphics.color().to_rgb();
                self.push(Object::Real(r))?;
                self.push(Object::Real(g))?;
                self.push(Object::Real(b))
            }
            OpKind::CurrentCmykColor => {
                let (c, m, y, k) = self.graphics.color().to_cmyk();
                self.push(Object::Real(c))?;
                self.push(Object::Real(m))?;
                self.push(Object::Real(y))?;
                self.push(Object::Real(k))
            }

            OpKind::Matrix => self.matrix(),
            OpKind::IdentMatrix => self.replace_matrix(Matrix::identity()),
            OpKind::CurrentMatrix => self.replace_matrix(self.graphics.ctm()),
            OpKind::DefaultMatrix => self.replace_matrix(self.graphics.default_matrix()),
            OpKind::InitMatrix => {
                self.graphics.init_matrix();
                Ok(())
            }
            OpKind::SetMatrix => self.setmatrix(),
            OpKind::Concat => self.concat(),
            OpKind::ConcatMatrix => self.concatmatrix(),
            OpKind::InvertMatrix => self.invertmatrix(),
            OpKind::Transform
            | OpKind::ITransform
            | OpKind::DTransform
            | OpKind::IdTransform => self.transform_op(kind),
            OpKind::Scale => self.scale(),
            OpKind::Rotate => self.rotate(),
            OpKind::Translate => self.translate(),

            OpKind::FindFont => self.findfont(),
            OpKind::ScaleFont => self.scalefont(),
            OpKind::SetFont => self.setfont(),
            OpKind::SelectFont => self.selectfont(),
            OpKind::Show => self.show(),
            OpKind::Charpath => self.charpath(),
            OpKind::StringWidth => self.stringwidth(),
        }
    }

    // composite construction

    fn build_array(&mut self, kind: ArrayKind) -> PostScriptResult<()> {
        let Some(n) = self.operand_stack.count_to_mark() else {
            anyhow::bail!(PostScriptError::with_detail(
                ErrorKind::UnmatchedMark,
                if kind == ArrayKind::Procedure { "}" } else { "]" },
                "no open mark on the stack",
            ));
        };

        let mut items = Vec::with_capacity(n);
        for i in (0..n).rev() {
            items.push(self.operand_stack.peek(i).unwrap().clone());
        }

        let _ = self.operand_stack.pop_n(n + 1);

        let idx = self
            .arrays
            .insert(ArrayObject::from_objects(items, kind, AllocMode::Local));

        self.push(match kind {
            ArrayKind::Array => Object::Array(idx),
            ArrayKind::Procedure => Object::Procedure(idx),
        })
    }

    fn build_dictionary(&mut self) -> PostScriptResult<()> {
        let Some(n) = self.operand_stack.count_to_mark() else {
            anyhow::bail!(PostScriptError::with_detail(
                ErrorKind::UnmatchedMark,
                ">>",
                "no open mark on the stack",
            ));
        };

        if n % 2 != 0 {
            anyhow::bail!(PostScriptError::with_detail(
                ErrorKind::RangeCheck,
                ">>",
                format!("dictionary requires key/value pairs, found {} operands", n),
            ));
        }

        let mut dict = DictObject::new(n, self.alloc_mode);

        for i in (0..n).step_by(2) {
            let value = self.operand_stack.peek(i).unwrap().clone();
            let key = self.operand_stack.peek(i + 1).unwrap().clone();

            dict.insert(self.dict_key(&key), value);
        }

        let _ = self.operand_stack.pop_n(n + 1);

        let idx = self.dictionaries.insert(dict);
        self.push(Object::Dictionary(idx))
    }

    fn read_dsc(&mut self, text: &str) -> PostScriptResult<()> {
        let Some(rest) = text.strip_prefix("BoundingBox:") else {
            return Ok(());
        };

        let dims: Vec<i32> = rest
            .split_whitespace()
            .map_while(|part| part.parse().ok())
            .collect();

        if let [x1, y1, x2, y2, ..] = dims[..] {
            let width = x2 - x1;
            let height = y2 - y1;

            if width > 0 && height > 0 {
                self.bounding_box = Some(BoundingBox {
                    x: f64::from(x1),
                    y: f64::from(y1),
                    width: f64::from(width),
                    height: f64::from(height),
                });
            }

            Ok(())
        } else if rest.trim_start().starts_with('(') {
            // (atend): the trailer is not consulted
            Ok(())
        } else {
            anyhow::bail!(PostScriptError::with_detail(
                ErrorKind::SyntaxError,
                "BoundingBox",
                "values must be 4 integers or '(atend)'",
            ))
        }
    }

    // printing

    fn print_top(&mut self) -> PostScriptResult<()> {
        let obj = self.pop()?;
        println!("{}", self.format_object(&obj));

        Ok(())
    }

    fn print_stack(&mut self) -> PostScriptResult<()> {
        let lines: Vec<String> = self
            .operand_stack
            .iter_top_down()
            .map(|obj| self.format_object(obj))
            .collect();

        for line in lines {
            println!("{}", line);
        }

        Ok(())
    }

    fn print_stack_plain(&mut self) -> PostScriptResult<()> {
        let lines: Vec<String> = self
            .operand_stack
            .iter_top_down()
            .map(|obj| match obj {
                Object::Bool(..) | Object::Integer(..) | Object::Real(..) => {
                    self.format_object(obj)
                }
                Object::Name(name) | Object::Literal(name) => {
                    String::from_utf8_lossy(name.as_bytes()).into_owned()
                }
                Object::String(idx) => {
                    String::from_utf8_lossy(self.strings.get(*idx).as_bytes()).into_owned()
                }
                _ => String::from("--nostringval--"),
            })
            .collect();

        for line in lines {
            println!("{}", line);
        }

        Ok(())
    }

    /// The written form, used by `=`, `==`, and `pstack`
    fn format_object(&self, obj: &Object) -> String {
        match obj {
            Object::Null => String::from("null"),
            Object::Bool(b) => String::from(if *b { "true" } else { "false" }),
            Object::Integer(n) => n.to_string(),
            Object::Real(v) => format_real(*v),
            Object::Operator(op) => format!("--{}--", op.name),
            Object::Name(name) => String::from_utf8_lossy(name.as_bytes()).into_owned(),
            Object::Literal(name) => format!("/{}", String::from_utf8_lossy(name.as_bytes())),
            Object::String(idx) => {
                let string = self.strings.get(*idx);
                let mut out = String::from("(");

                for &b in string.as_bytes() {
                    let printable = string.kind() == StringKind::Text
                        && (b == b' ' || b.is_ascii_graphic());

                    if printable {
                        out.push(b as char);
                    } else {
                        out.push_str(&format!("\\{:03o}", b));
                    }
                }

                out.push(')');
                out
            }
            Object::Array(idx) => format!("[{}]", self.format_array(*idx)),
            Object::Procedure(idx) => format!("{{{}}}", self.format_array(*idx)),
            Object::Dictionary(..) | Object::SystemDict | Object::Font(..) => {
                String::from("-dict-")
            }
            Object::Save(..) => String::from("-save-"),
            Object::File => String::from("-file-"),
            Object::Mark(Mark::ArrayClose) => String::from("]"),
            Object::Mark(Mark::DictClose) => String::from(">>"),
            Object::Mark(..) => String::from("-mark-"),
        }
    }

    fn format_array(&self, idx: ArrayIndex) -> String {
        let parts: Vec<String> = self
            .arrays
            .get(idx)
            .as_slice()
            .iter()
            .map(|obj| self.format_object(obj))
            .collect();

        parts.join(" ")
    }

    // arithmetic

    fn math_unary(&mut self, kind: OpKind) -> PostScriptResult<()> {
        let obj = self.pop()?;
        let v = obj.as_number().unwrap();

        match kind {
            OpKind::Sqrt => return self.push(Object::Real(v.sqrt())),
            OpKind::Ln => return self.push(Object::Real(v.ln())),
            OpKind::Log => return self.push(Object::Real(v.log10())),
            OpKind::Sin => return self.push(Object::Real(v.to_radians().sin())),
            OpKind::Cos => return self.push(Object::Real(v.to_radians().cos())),
            _ => {}
        }

        let result = match kind {
            OpKind::Abs => v.abs(),
            OpKind::Neg => -v,
            OpKind::Ceiling => v.ceil(),
            OpKind::Floor => v.floor(),
            OpKind::Round => v.round(),
            OpKind::Truncate => v.trunc(),
            _ => unreachable!(),
        };

        // these preserve the operand's type
        match obj {
            Object::Integer(..) => self.push_integer_result(result as i64),
            _ => self.push(Object::Real(result)),
        }
    }

    fn math_binary(&mut self, kind: OpKind) -> PostScriptResult<()> {
        let b_obj = self.pop()?;
        let a_obj = self.pop()?;

        let a = a_obj.as_number().unwrap();
        let b = b_obj.as_number().unwrap();
        let both_int = a_obj.is_integer() && b_obj.is_integer();

        match kind {
            OpKind::Add | OpKind::Sub | OpKind::Mul => {
                if both_int {
                    let (ai, bi) = (a as i64, b as i64);
                    let result = match kind {
                        OpKind::Add => ai + bi,
                        OpKind::Sub => ai - bi,
                        _ => ai * bi,
                    };

                    self.push_integer_result(result)
                } else {
                    let result = match kind {
                        OpKind::Add => a + b,
                        OpKind::Sub => a - b,
                        _ => a * b,
                    };

                    self.push(Object::Real(result))
                }
            }
            OpKind::Div => {
                if b == 0.0 {
                    return Err(self.err_detail(ErrorKind::RangeCheck, "zero divisor"));
                }

                self.push(Object::Real(a / b))
            }
            OpKind::Idiv | OpKind::Mod => {
                if !both_int {
                    return Err(
                        self.err_detail(ErrorKind::TypeCheck, "both operands must be integers")
                    );
                }

                let (ai, bi) = (a as i64, b as i64);
                if bi == 0 {
                    return Err(self.err_detail(ErrorKind::RangeCheck, "zero divisor"));
                }

                let result = if kind == OpKind::Idiv {
                    ai / bi
                } else {
                    ai % bi
                };

                self.push_integer_result(result)
            }
            OpKind::Atan => self.push(Object::Real(a.atan2(b).to_degrees())),
            OpKind::Exp => self.push(Object::Real(a.powf(b))),
            _ => unreachable!(),
        }
    }

    fn rand(&mut self) -> PostScriptResult<()> {
        self.rand_state = self
            .rand_state
            .wrapping_mul(1_103_515_245)
            .wrapping_add(12_345)
            & 0x7fff_ffff;

        self.push(Object::Integer(self.rand_state as i32))
    }

    fn srand(&mut self) -> PostScriptResult<()> {
        let seed = self.pop_integer()?;

        self.rand_seed = seed.unsigned_abs();
        self.rand_state = self.rand_seed & 0x7fff_ffff;

        Ok(())
    }

    fn rrand(&mut self) -> PostScriptResult<()> {
        self.push_number(f64::from(self.rand_seed), false)
    }

    // logic

    fn logic_binary(&mut self, kind: OpKind) -> PostScriptResult<()> {
        let b = self.pop()?;
        let a = self.pop()?;

        match (a, b) {
            (Object::Integer(a), Object::Integer(b)) => {
                let result = match kind {
                    OpKind::And => a & b,
                    OpKind::Or => a | b,
                    _ => a ^ b,
                };

                self.push(Object::Integer(result))
            }
            (Object::Bool(a), Object::Bool(b)) => {
                let result = match kind {
                    OpKind::And => a && b,
                    OpKind::Or => a || b,
                    _ => a != b,
                };

                self.push(Object::Bool(result))
            }
            _ => Err(self.typecheck()),
        }
    }

    fn logic_not(&mut self) -> PostScriptResult<()> {
        match self.pop()? {
            Object::Integer(n) => self.push(Object::Integer(!n)),
            Object::Bool(b) => self.push(Object::Bool(!b)),
            _ => Err(self.typecheck()),
        }
    }

    fn bitshift(&mut self) -> PostScriptResult<()> {
        let shift = self.pop()?;
        let value = self.pop()?;

        let (Object::Integer(value), Object::Integer(shift)) = (value, shift) else {
            return Err(self.typecheck());
        };

        let result = match shift.cmp(&0) {
            std::cmp::Ordering::Greater => value.checked_shl(shift as u32).unwrap_or(0),
            std::cmp::Ordering::Less => value
                .checked_shr(shift.unsigned_abs())
                .unwrap_or(value >> 31),
            std::cmp::Ordering::Equal => value,
        };

        self.push(Object::Integer(result))
    }

    // comparisons

    fn objects_equal(&self, a: &Object, b: &Object) -> bool {
        if let (Some(x), Some(y)) = (a.as_number(), b.as_number()) {
            return x == y;
        }

        if a.is_string_type() && b.is_string_type() {
            return self.string_type_bytes(a) == self.string_type_bytes(b);
        }

        match (a, b) {
            (Object::Bool(x), Object::Bool(y)) => x == y,
            (Object::Null, Object::Null) => true,
            (Object::Name(x), Object::Name(y)) => x == y,
            (Object::Array(x), Object::Array(y)) => x == y,
            (Object::Procedure(x), Object::Procedure(y)) => x == y,
            (Object::Dictionary(x), Object::Dictionary(y)) => x == y,
            (Object::SystemDict, Object::SystemDict) => true,
            (Object::Font(x), Object::Font(y)) => x == y,
            (Object::Save(x), Object::Save(y)) => x == y,
            (Object::File, Object::File) => true,
            (Object::Operator(x), Object::Operator(y)) => std::ptr::eq(*x, *y),
            (Object::Mark(x), Object::Mark(y)) => x == y,
            _ => false,
        }
    }

    fn eq(&mut self, negate: bool) -> PostScriptResult<()> {
        let b = self.pop()?;
        let a = self.pop()?;

        let equal = self.objects_equal(&a, &b);

        self.push(Object::Bool(equal != negate))
    }

    fn compare(&mut self, kind: OpKind) -> PostScriptResult<()> {
        use std::cmp::Ordering;

        let b = self.pop()?;
        let a = self.pop()?;

        let ordering = if let (Some(x), Some(y)) = (a.as_number(), b.as_number()) {
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        } else if let (Object::String(x), Object::String(y)) = (&a, &b) {
            self.strings.get(*x).as_bytes().cmp(self.strings.get(*y).as_bytes())
        } else {
            return Err(self.err_detail(
                ErrorKind::TypeCheck,
                "operands must be both numbers or both strings",
            ));
        };

        let result = match kind {
            OpKind::Lt => ordering == Ordering::Less,
            OpKind::Le => ordering != Ordering::Greater,
            OpKind::Gt => ordering == Ordering::Greater,
            _ => ordering != Ordering::Less,
        };

        self.push(Object::Bool(result))
    }

    // stack manipulation

    fn exch(&mut self) -> PostScriptResult<()> {
        let a = self.pop()?;
        let b = self.pop()?;

        self.push(a)?;
        self.push(b)
    }

    fn count_to_mark(&mut self) -> PostScriptResult<()> {
        match self.operand_stack.count_to_mark() {
            Some(n) => self.push_number(n as f64, false),
            None => Err(self.err(ErrorKind::UnmatchedMark)),
        }
    }

    fn clear_to_mark(&mut self) -> PostScriptResult<()> {
        match self.operand_stack.count_to_mark() {
            Some(n) => self.pop_n(n + 1),
            None => Err(self.err(ErrorKind::UnmatchedMark)),
        }
    }

    fn index(&mut self) -> PostScriptResult<()> {
        let n = match self.peek(0)? {
            Object::Integer(n) => *n,
            _ => return Err(self.err_detail(ErrorKind::TypeCheck, "index must be an integer")),
        };

        if n < 0 {
            return Err(self.err_detail(ErrorKind::RangeCheck, format!("index is negative: {}", n)));
        }

        let depth = self.operand_stack.len() - 1;
        let n = n as usize;
        if n >= depth {
            return Err(self.err_detail(
                ErrorKind::StackUnderflow,
                format!("index is out of range: {}", n),
            ));
        }

        self.pop()?;
        let obj = self.peek(n)?.clone();

        self.push(obj)
    }

    fn copy(&mut self) -> PostScriptResult<()> {
        let n = match self.peek(0)? {
            Object::Integer(n) => *n,
            _ => return Err(self.err_detail(ErrorKind::TypeCheck, "integer operand required")),
        };

        if n < 0 {
            return Err(self.err(ErrorKind::RangeCheck));
        }

        let count = n as usize;
        if count > self.operand_stack.len() - 1 {
            return Err(self.err_detail(
                ErrorKind::StackUnderflow,
                format!("required: {}, stack size: {}", count, self.operand_stack.len() - 1),
            ));
        }

        self.pop()?;

        for _ in 0..count {
            let obj = self.peek(count - 1)?.clone();
            self.push(obj)?;
        }

        Ok(())
    }

    fn roll(&mut self) -> PostScriptResult<()> {
        let (times, count) = match (self.peek(0)?, self.peek(1)?) {
            (Object::Integer(j), Object::Integer(n)) => (*j, *n),
            _ => {
                return Err(
                    self.err_detail(ErrorKind::TypeCheck, "both operands must be integers")
                )
            }
        };

        if count < 0 {
            return Err(self.err(ErrorKind::RangeCheck));
        }

        if count as usize > self.operand_stack.len() - 2 {
            return Err(self.err(ErrorKind::StackUnderflow));
        }

        self.pop_n(2)?;
        self.operand_stack.roll(count as usize, times);

        Ok(())
    }

    fn array(&mut self) -> PostScriptResult<()> {
        let n = match self.peek(0)? {
            Object::Integer(n) => i64::from(*n),
            _ => return Err(self.typecheck()),
        };

        let len = check_object_size(n, "array")?;

        self.pop()?;
        let idx = self
            .arrays
            .insert(ArrayObject::new(len, ArrayKind::Array, AllocMode::Local));

        self.push(Object::Array(idx))
    }

    fn aload(&mut self) -> PostScriptResult<()> {
        let idx = match self.peek(0)? {
            Object::Array(idx) => *idx,
            _ => return Err(self.typecheck()),
        };

        self.pop()?;

        let items = self.arrays.get(idx).as_slice().to_vec();
        for item in items {
            self.push(item)?;
        }

        self.push(Object::Array(idx))
    }

    fn astore(&mut self) -> PostScriptResult<()> {
        let idx = match self.peek(0)? {
            Object::Array(idx) => *idx,
            _ => return Err(self.typecheck()),
        };

        let len = self.arrays.get(idx).len();
        if len == 0 {
            return Ok(());
        }

        if self.operand_stack.len() - 1 < len {
            return Err(self.err(ErrorKind::StackUnderflow));
        }

        self.pop()?;

        let mut items = Vec::with_capacity(len);
        for _ in 0..len {
            items.push(self.pop()?);
        }

        let array = self.arrays.get_mut(idx);
        for (i, obj) in items.into_iter().enumerate() {
            array.put(len - 1 - i, obj)?;
        }

        self.push(Object::Array(idx))
    }

    // dictionary operators

    fn def(&mut self) -> PostScriptResult<()> {
        let value = self.pop()?;
        let key = self.pop()?;

        match self.dict_stack.current() {
            StackDict::User(idx) => {
                let dict_key = self.dict_key(&key);
                self.dictionaries.get_mut(idx).insert(dict_key, value);

                Ok(())
            }
            StackDict::System => Err(self.err_detail(
                ErrorKind::InvalidAccess,
                "the system dictionary is read-only",
            )),
        }
    }

    fn begin(&mut self) -> PostScriptResult<()> {
        match self.pop()? {
            Object::Dictionary(idx) => {
                self.dict_stack.push(StackDict::User(idx));
                Ok(())
            }
            Object::SystemDict => {
                self.dict_stack.push(StackDict::System);
                Ok(())
            }
            _ => Err(self.err_detail(ErrorKind::TypeCheck, "dictionary operand expected")),
        }
    }

    fn end(&mut self) -> PostScriptResult<()> {
        if self.dict_stack.pop() {
            Ok(())
        } else {
            Err(self.err(ErrorKind::DictStackUnderflow))
        }
    }

    fn dict(&mut self) -> PostScriptResult<()> {
        let n = match self.peek(0)? {
            Object::Integer(n) => i64::from(*n),
            _ => return Err(self.err_detail(ErrorKind::TypeCheck, "integer operand required")),
        };

        let capacity = check_object_size(n, "dict")?;

        self.pop()?;
        let idx = self
            .dictionaries
            .insert(DictObject::new(capacity, self.alloc_mode));

        self.push(Object::Dictionary(idx))
    }

    fn load(&mut self) -> PostScriptResult<()> {
        let key = self.peek(0)?.clone();

        if let Some(value) = self.find_by_key(&key) {
            self.pop()?;
            return self.push(value);
        }

        if let Some(bytes) = self.string_type_bytes(&key) {
            if let Some(value) = system_lookup(&bytes) {
                self.pop()?;
                return self.push(value);
            }

            return Err(self.err_detail(
                ErrorKind::Undefined,
                format!("key '{}' not found", String::from_utf8_lossy(&bytes)),
            ));
        }

        Err(self.err_detail(ErrorKind::Undefined, "key not found"))
    }

    fn currentdict(&mut self) -> PostScriptResult<()> {
        let current = match self.dict_stack.current() {
            StackDict::User(idx) => Object::Dictionary(idx),
            StackDict::System => Object::SystemDict,
        };

        self.push(current)
    }

    fn where_(&mut self) -> PostScriptResult<()> {
        let key = self.pop()?;

        for scope in self.dict_stack.scopes().collect::<Vec<_>>() {
            match scope {
                StackDict::User(idx) => {
                    if let Some(dict_key) = self.dict_key(&key) {
                        if self.dictionaries.get(idx).contains(&dict_key) {
                            self.push(Object::Dictionary(idx))?;
                            return self.push(Object::Bool(true));
                        }
                    }
                }
                StackDict::System => {
                    if let Some(bytes) = self.string_type_bytes(&key) {
                        if system_lookup(&bytes).is_some() {
                            self.push(Object::SystemDict)?;
                            return self.push(Object::Bool(true));
                        }
                    }
                }
            }
        }

        if let Some(bytes) = self.string_type_bytes(&key) {
            if system_lookup(&bytes).is_some() {
                self.push(Object::SystemDict)?;
                return self.push(Object::Bool(true));
            }
        }

        self.push(Object::Bool(false))
    }

    fn bind(&mut self) -> PostScriptResult<()> {
        match self.peek(0)? {
            Object::Array(idx) | Object::Procedure(idx) => {
                let idx = *idx;
                self.bind_procedure(idx)
            }
            _ => Err(self.err_detail(ErrorKind::TypeCheck, "operand must be a procedure")),
        }
    }

    /// Rewrites names that resolve to built-in operators into the
    /// operators themselves, recursing into nested procedures
    fn bind_procedure(&mut self, idx: ArrayIndex) -> PostScriptResult<()> {
        for i in 0..self.arrays.get(idx).len() {
            let element = self.arrays.get(idx).as_slice()[i].clone();

            match element {
                Object::Name(name) => {
                    if let Some(resolved @ Object::Operator(..)) = system_lookup(name.as_bytes()) {
                        self.arrays.get_mut(idx).put(i, resolved)?;
                    }
                }
                Object::Procedure(nested) => self.bind_procedure(nested)?,
                _ => {}
            }
        }

        Ok(())
    }

    fn get(&mut self) -> PostScriptResult<()> {
        let key = self.peek(0)?.clone();
        let container = self.peek(1)?.clone();

        match container {
            Object::Array(idx) | Object::Procedure(idx) if key.is_integer() => {
                let Object::Integer(i) = key else { unreachable!() };
                if i < 0 {
                    return Err(self.err(ErrorKind::RangeCheck));
                }

                let value = self.arrays.get(idx).get(i as usize)?;

                self.pop_n(2)?;
                self.push(value)
            }
            Object::String(idx) if key.is_integer() => {
                let Object::Integer(i) = key else { unreachable!() };
                if i < 0 {
                    return Err(self.err(ErrorKind::RangeCheck));
                }

                let byte = self.strings.get(idx).get(i as usize)?;

                self.pop_n(2)?;
                self.push(Object::Integer(i32::from(byte)))
            }
            Object::Dictionary(idx) => {
                let value = self
                    .dict_key(&key)
                    .and_then(|dict_key| self.dictionaries.get(idx).get(&dict_key).cloned());

                match value {
                    Some(value) => {
                        self.pop_n(2)?;
                        self.push(value)
                    }
                    None => Err(self.err(ErrorKind::Undefined)),
                }
            }
            Object::SystemDict => {
                let value = self
                    .string_type_bytes(&key)
                    .and_then(|bytes| system_lookup(&bytes));

                match value {
                    Some(value) => {
                        self.pop_n(2)?;
                        self.push(value)
                    }
                    None => Err(self.err(ErrorKind::Undefined)),
                }
            }
            _ => Err(self.typecheck()),
        }
    }

    fn put(&mut self) -> PostScriptResult<()> {
        let value = self.peek(0)?.clone();
        let key = self.peek(1)?.clone();
        let container = self.peek(2)?.clone();

        match container {
            Object::Array(idx) | Object::Procedure(idx) if key.is_integer() => {
                let Object::Integer(i) = key else { unreachable!() };
                if i < 0 {
                    return Err(self.err(ErrorKind::RangeCheck));
                }

                self.arrays.get_mut(idx).put(i as usize, value)?;
                self.pop_n(3)
            }
            Object::String(idx) if key.is_integer() && value.is_integer() => {
                let (Object::Integer(i), Object::Integer(byte)) = (key, value) else {
                    unreachable!()
                };
                if i < 0 {
                    return Err(self.err(ErrorKind::RangeCheck));
                }

                self.strings.get_mut(idx).put(i as usize, byte)?;
                self.pop_n(3)
            }
            Object::Dictionary(idx) => {
                let dict_key = self.dict_key(&key);
                self.dictionaries.get_mut(idx).insert(dict_key, value);
                self.pop_n(3)
            }
            Object::SystemDict => Err(self.err_detail(
                ErrorKind::InvalidAccess,
                "the system dictionary is read-only",
            )),
            _ => Err(self.typecheck()),
        }
    }

    fn length(&mut self) -> PostScriptResult<()> {
        let len = match self.peek(0)? {
            Object::Name(name) | Object::Literal(name) => name.len(),
            Object::String(idx) => self.strings.get(*idx).len(),
            Object::Array(idx) | Object::Procedure(idx) => self.arrays.get(*idx).len(),
            Object::Dictionary(idx) => self.dictionaries.get(*idx).len(),
            Object::SystemDict => operator::table_len(),
            Object::Font(..) | Object::Save(..) => 0,
            _ => return Err(self.typecheck()),
        };

        self.pop()?;
        self.push_number(len as f64, false)
    }

    // conversions

    fn cvs(&mut self) -> PostScriptResult<()> {
        let dest = match self.peek(0)? {
            Object::String(idx) => *idx,
            _ => return Err(self.typecheck()),
        };

        let src = self.peek(1)?.clone();

        let formatted: Vec<u8> = match &src {
            Object::Literal(..) | Object::String(..) => self.string_type_bytes(&src).unwrap(),
            Object::Integer(n) => n.to_string().into_bytes(),
            Object::Real(v) => format_real(*v).into_bytes(),
            Object::Bool(b) => if *b { b"true".to_vec() } else { b"false".to_vec() },
            Object::Operator(op) => op.name.as_bytes().to_vec(),
            _ => b"--nostringval--".to_vec(),
        };

        if formatted.len() > self.strings.get(dest).len() {
            return Err(self.err(ErrorKind::RangeCheck));
        }

        self.strings.get_mut(dest).replace_prefix(&formatted);

        self.pop_n(2)?;
        self.push(Object::String(dest))
    }

    fn cvx(&mut self) -> PostScriptResult<()> {
        let obj = self.pop()?;

        let converted = match obj {
            Object::Array(idx) => Object::Procedure(idx),
            Object::Literal(name) => Object::Name(name),
            Object::String(..) => {
                return Err(
                    self.err_detail(ErrorKind::Unsupported, "'()' operands are not supported")
                )
            }
            obj => obj,
        };

        self.push(converted)
    }

    fn string(&mut self) -> PostScriptResult<()> {
        let n = match self.peek(0)? {
            Object::Integer(n) => i64::from(*n),
            _ => return Err(self.typecheck()),
        };

        let len = check_object_size(n, "string")?;

        self.pop()?;
        let idx = self.strings.insert(StringObject::zeroed(len));

        self.push(Object::String(idx))
    }

    // control flow

    fn exec(&mut self, scanner: &mut Scanner) -> PostScriptResult<()> {
        match self.peek(0)?.clone() {
            Object::Name(name) => {
                self.pop()?;
                self.resolve_name(scanner, name.as_bytes(), false)
            }
            Object::Procedure(idx) => {
                self.pop()?;
                self.execute_procedure(scanner, idx)
            }
            Object::String(..) => Err(self.err_detail(
                ErrorKind::Unsupported,
                "'()' operands are not supported",
            )),
            // anything else is already in its executable form
            _ => Ok(()),
        }
    }

    fn if_op(&mut self, scanner: &mut Scanner) -> PostScriptResult<()> {
        let (Object::Procedure(proc), Object::Bool(condition)) = (self.peek(0)?, self.peek(1)?)
        else {
            return Err(self.typecheck());
        };
        let (proc, condition) = (*proc, *condition);

        self.pop_n(2)?;

        if condition {
            self.execute_procedure(scanner, proc)?;
        }

        Ok(())
    }

    fn ifelse(&mut self, scanner: &mut Scanner) -> PostScriptResult<()> {
        let (Object::Procedure(proc2), Object::Procedure(proc1), Object::Bool(condition)) =
            (self.peek(0)?, self.peek(1)?, self.peek(2)?)
        else {
            return Err(self.typecheck());
        };
        let (proc2, proc1, condition) = (*proc2, *proc1, *condition);

        self.pop_n(3)?;

        self.execute_procedure(scanner, if condition { proc1 } else { proc2 })
    }

    fn repeat(&mut self, scanner: &mut Scanner) -> PostScriptResult<()> {
        let (Object::Procedure(proc), Object::Integer(times)) = (self.peek(0)?, self.peek(1)?)
        else {
            return Err(self.typecheck());
        };
        let (proc, times) = (*proc, *times);

        if times < 0 {
            return Err(self.err(ErrorKind::RangeCheck));
        }

        self.pop_n(2)?;

        self.loop_count += 1;
        let snapshot = self.loop_count;

        for _ in 0..times {
            if self.loop_count < snapshot {
                break;
            }

            self.execute_procedure(scanner, proc)?;
        }

        Ok(())
    }

    fn for_op(&mut self, scanner: &mut Scanner) -> PostScriptResult<()> {
        let Object::Procedure(proc) = self.peek(0)? else {
            return Err(self.typecheck());
        };
        let proc = *proc;

        let limit = self.peek_number(1)?;
        let increment = self.peek_number(2)?;
        let initial = self.peek_number(3)?;

        // the control value stays an integer only for integer bounds
        let control_is_int = self.peek(2)?.is_integer() && self.peek(3)?.is_integer();

        if increment == 0.0 {
            return Err(self.err_detail(
                ErrorKind::RangeCheck,
                "a zero increment would loop forever",
            ));
        }

        self.pop_n(4)?;

        self.loop_count += 1;
        let snapshot = self.loop_count;

        let mut control = initial;
        loop {
            let past_limit = if increment > 0.0 {
                control > limit
            } else {
                control < limit
            };

            if past_limit || self.loop_count < snapshot {
                break;
            }

            if control_is_int {
                self.push(Object::Integer(control as i32))?;
            } else {
                self.push(Object::Real(control))?;
            }

            self.execute_procedure(scanner, proc)?;

            control += increment;
        }

        Ok(())
    }

    fn token(&mut self, scanner: &mut Scanner) -> PostScriptResult<()> {
        match self.pop()? {
            Object::File => {
                let next = scanner.has_token().map_err(anyhow::Error::new)?;

                match next {
                    Some(token) => {
                        // scanned names are deferred, not executed
                        self.procedure_depth += 1;
                        self.process_token(scanner, token)?;
                        self.procedure_depth -= 1;

                        self.push(Object::Bool(true))
                    }
                    None => self.push(Object::Bool(false)),
                }
            }
            Object::String(..) => Err(self.err_detail(
                ErrorKind::Unsupported,
                "'()' operands are not supported",
            )),
            _ => Err(self.typecheck()),
        }
    }

    // save / restore

    fn save(&mut self) -> PostScriptResult<()> {
        let mut map = CloneMap::default();

        let stack: Vec<StackDict> = self
            .dict_stack
            .stack
            .clone()
            .into_iter()
            .map(|scope| match scope {
                StackDict::User(idx) => StackDict::User(self.clone_dict(idx, &mut map)),
                StackDict::System => StackDict::System,
            })
            .collect();

        let local = self.clone_dict(self.dict_stack.local, &mut map);

        let idx = self.saves.insert(SavedState { stack, local });

        self.push(Object::Save(idx))?;
        self.graphics.gsave();

        Ok(())
    }

    fn restore(&mut self) -> PostScriptResult<()> {
        let Object::Save(idx) = self.peek(0)? else {
            return Err(self.typecheck());
        };

        let saved = self.saves.get(*idx).clone();

        self.pop()?;

        self.dict_stack = DictStack::new(saved.local);
        self.dict_stack.stack = saved.stack;

        self.graphics.grestore();

        Ok(())
    }

    fn clone_dict(&mut self, idx: DictIndex, map: &mut CloneMap) -> DictIndex {
        if let Some(&copy) = map.dicts.get(&idx) {
            return copy;
        }

        let capacity = self.dictionaries.get(idx).capacity();
        let copy = self
            .dictionaries
            .insert(DictObject::new(capacity, AllocMode::Local));

        // register before descending so cycles resolve to the copy
        map.dicts.insert(idx, copy);

        let string_entries: Vec<(Vec<u8>, Object)> = self
            .dictionaries
            .get(idx)
            .string_entries()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let scalar_entries: Vec<(String, Object)> = self
            .dictionaries
            .get(idx)
            .scalar_entries()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        for (key, value) in string_entries {
            let cloned = self.clone_value(&value, map);
            self.dictionaries
                .get_mut(copy)
                .insert(Some(DictKey::Str(key)), cloned);
        }

        for (key, value) in scalar_entries {
            let cloned = self.clone_value(&value, map);
            self.dictionaries
                .get_mut(copy)
                .insert(Some(DictKey::Scalar(key)), cloned);
        }

        copy
    }

    fn clone_array(&mut self, idx: ArrayIndex, map: &mut CloneMap) -> ArrayIndex {
        if let Some(&copy) = map.arrays.get(&idx) {
            return copy;
        }

        let source = self.arrays.get(idx);
        let (len, kind) = (source.len(), source.kind());

        let copy = self
            .arrays
            .insert(ArrayObject::new(len, kind, AllocMode::Local));
        map.arrays.insert(idx, copy);

        for i in 0..len {
            let element = self.arrays.get(idx).as_slice()[i].clone();
            let cloned = self.clone_value(&element, map);

            // the copy has the same length, so this cannot fail
            let _ = self.arrays.get_mut(copy).put(i, cloned);
        }

        copy
    }

    /// Deep clone: arrays and user dictionaries are duplicated
    /// recursively; every other composite is shared
    fn clone_value(&mut self, obj: &Object, map: &mut CloneMap) -> Object {
        match obj {
            Object::Array(idx) => Object::Array(self.clone_array(*idx, map)),
            Object::Procedure(idx) => Object::Procedure(self.clone_array(*idx, map)),
            Object::Dictionary(idx) => Object::Dictionary(self.clone_dict(*idx, map)),
            obj => obj.clone(),
        }
    }

    fn setglobal(&mut self) -> PostScriptResult<()> {
        let global = self.pop_bool()?;

        self.alloc_mode = if global {
            AllocMode::Global
        } else {
            AllocMode::Local
        };

        Ok(())
    }

    fn setpagedevice(&mut self) -> PostScriptResult<()> {
        let Object::Dictionary(idx) = self.peek(0)? else {
            return Err(self.typecheck());
        };

        let page_size = self
            .dictionaries
            .get(*idx)
            .get(&DictKey::Str(b"PageSize".to_vec()))
            .cloned();

        if let Some(Object::Array(arr)) = page_size {
            let array = self.arrays.get(arr);

            if array.len() == 2 && array.is_numeric() {
                let width = array.get(0)?.as_number().unwrap();
                let height = array.get(1)?.as_number().unwrap();

                if width > 0.0 && height > 0.0 {
                    self.graphics.set_page_size(width, height);
                } else {
                    return Err(self.err(ErrorKind::RangeCheck));
                }
            }
        }

        self.pop().map(|_| ())
    }

    fn push_text(&mut self, bytes: &[u8]) -> PostScriptResult<()> {
        let idx = self
            .strings
            .insert(StringObject::from_bytes(bytes.to_vec(), StringKind::Text));

        self.push(Object::String(idx))
    }

    // graphics helpers

    /// Reads `N` numeric operands in push order (deepest first) without
    /// popping them; arity and numeric checks have already run
    fn numeric_args<const N: usize>(&self) -> PostScriptResult<[f64; N]> {
        let mut v = [0.0; N];

        for (i, slot) in v.iter_mut().rev().enumerate() {
            *slot = self.peek_number(i)?;
        }

        Ok(v)
    }

    fn peek_integer(&self, depth: usize) -> PostScriptResult<i32> {
        match self.peek(depth)? {
            Object::Integer(n) => Ok(*n),
            _ => Err(self.typecheck()),
        }
    }

    fn setdash(&mut self) -> PostScriptResult<()> {
        let offset = match self.peek(0)?.as_number() {
            Some(v) => v,
            None => return Err(self.typecheck()),
        };
        let Object::Array(idx) = self.peek(1)? else {
            return Err(self.typecheck());
        };
        let idx = *idx;

        let array = self.arrays.get(idx);

        if array.is_numeric() {
            let values: Vec<f64> = array
                .as_slice()
                .iter()
                .map(|obj| obj.as_number().unwrap())
                .collect();

            if values.iter().any(|&v| v < 0.0) || values.iter().all(|&v| v == 0.0) {
                return Err(self.err(ErrorKind::RangeCheck));
            }

            self.pop_n(2)?;
            self.graphics.set_dash(values, offset);

            Ok(())
        } else if array.len() == 0 {
            self.pop_n(2)?;
            self.graphics.set_dash(Vec::new(), offset);

            Ok(())
        } else {
            Err(self.typecheck())
        }
    }

    // matrix operators

    /// The matrix on top of the stack, if the operand is a six-element
    /// numeric array
    fn peek_matrix(&self, depth: usize) -> Option<(ArrayIndex, Matrix)> {
        match self.operand_stack.peek(depth)? {
            Object::Array(idx) => self.arrays.get(*idx).to_matrix().map(|m| (*idx, m)),
            _ => None,
        }
    }

    fn matrix(&mut self) -> PostScriptResult<()> {
        let elements = Matrix::identity()
            .to_array()
            .into_iter()
            .map(Object::Real)
            .collect();

        let idx = self.arrays.insert(ArrayObject::from_objects(
            elements,
            ArrayKind::Array,
            AllocMode::Local,
        ));

        self.push(Object::Array(idx))
    }

    /// `identmatrix`, `currentmatrix`, and `defaultmatrix` overwrite the
    /// array on top of the stack and leave it there
    fn replace_matrix(&mut self, m: Matrix) -> PostScriptResult<()> {
        let Some((idx, _)) = self.peek_matrix(0) else {
            return Err(self.typecheck());
        };

        self.arrays.get_mut(idx).store_matrix(&m);

        Ok(())
    }

    fn setmatrix(&mut self) -> PostScriptResult<()> {
        let Some((_, m)) = self.peek_matrix(0) else {
            return Err(self.typecheck());
        };

        self.graphics.set_ctm(m);
        self.pop().map(|_| ())
    }

    fn concat(&mut self) -> PostScriptResult<()> {
        let Some((_, m)) = self.peek_matrix(0) else {
            return Err(self.typecheck());
        };

        self.graphics.concat(&m);
        self.pop().map(|_| ())
    }

    fn concatmatrix(&mut self) -> PostScriptResult<()> {
        let (Some((dest, _)), Some((_, m2)), Some((_, m1))) = (
            self.peek_matrix(0),
            self.peek_matrix(1),
            self.peek_matrix(2),
        ) else {
            return Err(self.err_detail(
                ErrorKind::TypeCheck,
                "valid format: matrix matrix matrix concatmatrix",
            ));
        };

        self.arrays
            .get_mut(dest)
            .store_matrix(&Matrix::multiply(&m1, &m2));

        self.pop_n(3)?;
        self.push(Object::Array(dest))
    }

    fn invertmatrix(&mut self) -> PostScriptResult<()> {
        let (Some((dest, _)), Some((_, src))) = (self.peek_matrix(0), self.peek_matrix(1)) else {
            return Err(self.err_detail(
                ErrorKind::TypeCheck,
                "valid format: matrix matrix invertmatrix",
            ));
        };

        let Some(inverse) = src.invert() else {
            return Err(self.err_detail(ErrorKind::RangeCheck, "matrix is not invertible"));
        };

        self.arrays.get_mut(dest).store_matrix(&inverse);

        self.pop_n(2)?;
        self.push(Object::Array(dest))
    }

    /// Operand pattern shared by the transform operators and
    /// `scale`/`translate`: either `x y` acting through the CTM, or
    /// `x y matrix` acting through the supplied matrix
    fn transform_params(&self) -> PostScriptResult<(f64, f64, Option<ArrayIndex>, usize)> {
        if let (Ok(y), Ok(x)) = (self.peek_number(0), self.peek_number(1)) {
            return Ok((x, y, None, 2));
        }

        if let Some((idx, _)) = self.peek_matrix(0) {
            if self.operand_stack.len() >= 3 {
                if let (Ok(y), Ok(x)) = (self.peek_number(1), self.peek_number(2)) {
                    return Ok((x, y, Some(idx), 3));
                }
            }
        }

        Err(self.err_detail(ErrorKind::TypeCheck, "valid format: x y or x y matrix"))
    }

    fn transform_op(&mut self, kind: OpKind) -> PostScriptResult<()> {
        let (x, y, matrix, count) = self.transform_params()?;

        let m = match matrix {
            Some(idx) => self.arrays.get(idx).to_matrix().unwrap(),
            None => self.graphics.ctm(),
        };

        let m = if matches!(kind, OpKind::ITransform | OpKind::IdTransform) {
            match m.invert() {
                Some(inverse) => inverse,
                None => {
                    return Err(self.err_detail(ErrorKind::RangeCheck, "matrix is not invertible"))
                }
            }
        } else {
            m
        };

        let (rx, ry) = if matches!(kind, OpKind::Transform | OpKind::ITransform) {
            m.transform_point(x, y)
        } else {
            m.transform_distance(x, y)
        };

        self.pop_n(count)?;
        self.push(Object::Real(rx))?;
        self.push(Object::Real(ry))
    }

    fn scale(&mut self) -> PostScriptResult<()> {
        let (x, y, matrix, count) = self.transform_params()?;

        match matrix {
            None => {
                self.graphics.scale(x, y);
                self.pop_n(count)
            }
            Some(idx) => {
                let m = self.arrays.get(idx).to_matrix().unwrap();
                let scaled = Matrix::multiply(&Matrix::scaling(x, y), &m);

                self.arrays.get_mut(idx).store_matrix(&scaled);

                self.pop_n(count)?;
                self.push(Object::Array(idx))
            }
        }
    }

    fn translate(&mut self) -> PostScriptResult<()> {
        let (x, y, matrix, count) = self.transform_params()?;

        match matrix {
            None => {
                self.graphics.translate(x, y);
                self.pop_n(count)
            }
            Some(idx) => {
                let m = self.arrays.get(idx).to_matrix().unwrap();
                let translated = Matrix::multiply(&Matrix::translation(x, y), &m);

                self.arrays.get_mut(idx).store_matrix(&translated);

                self.pop_n(count)?;
                self.push(Object::Array(idx))
            }
        }
    }

    fn rotate(&mut self) -> PostScriptResult<()> {
        if let Ok(degrees) = self.peek_number(0) {
            self.graphics.rotate(degrees);
            return self.pop_n(1);
        }

        let Some((idx, m)) = self.peek_matrix(0) else {
            return Err(self.typecheck());
        };

        if self.operand_stack.len() < 2 {
            return Err(self.err(ErrorKind::StackUnderflow));
        }

        let degrees = self.peek_number(1)?;
        let rotated = Matrix::multiply(&Matrix::rotation(degrees.to_radians()), &m);

        self.arrays.get_mut(idx).store_matrix(&rotated);

        self.pop_n(2)?;
        self.push(Object::Array(idx))
    }

    // text and fonts

    fn findfont(&mut self) -> PostScriptResult<()> {
        let name = match self.string_type_bytes(self.peek(0)?) {
            Some(bytes) => bytes,
            None => return Err(self.typecheck()),
        };

        let face = font::find_face(&name);
        let idx = self.fonts.insert(FontObject::new(face));

        self.pop()?;
        self.push(Object::Font(idx))
    }

    fn scalefont(&mut self) -> PostScriptResult<()> {
        let size = self.peek_number(0)?;
        if size < 0.0 {
            return Err(self.err(ErrorKind::RangeCheck));
        }

        let Object::Font(idx) = self.peek(1)? else {
            return Err(self.typecheck());
        };
        let idx = *idx;

        self.pop()?;

        let font = self.fonts.get_mut(idx);
        font.point_size = size;
        font.matrix = [size, 0.0, 0.0, size, 0.0, 0.0];

        Ok(())
    }

    fn setfont(&mut self) -> PostScriptResult<()> {
        let Object::Font(idx) = self.peek(0)? else {
            return Err(self.typecheck());
        };

        let font = self.fonts.get(*idx).clone();

        self.pop()?;
        self.graphics
            .set_font(font.family, font.slant, font.bold, font.point_size);

        Ok(())
    }

    fn selectfont(&mut self) -> PostScriptResult<()> {
        let size_ok = self.peek(0)?.is_number();
        let name_ok = self.string_type_bytes(self.peek(1)?).is_some();

        if !size_ok || !name_ok {
            return Err(self.typecheck());
        }

        if self.peek_number(0)? < 0.0 {
            return Err(self.err(ErrorKind::RangeCheck));
        }

        self.exch()?;

        let result = self.selectfont_sequence();

        if result.is_err() {
            let _ = self.exch();
        }

        result
    }

    fn selectfont_sequence(&mut self) -> PostScriptResult<()> {
        self.findfont()?;
        self.exch()?;
        self.scalefont()?;
        self.setfont()
    }

    fn show(&mut self) -> PostScriptResult<()> {
        if !self.graphics.has_current_point() {
            return Err(self.err(ErrorKind::NoCurrentPoint));
        }

        let Object::String(idx) = self.peek(0)? else {
            return Err(self.typecheck());
        };

        let text = self.strings.get(*idx).as_bytes().to_vec();

        self.pop()?;
        self.graphics.show(&text)
    }

    fn charpath(&mut self) -> PostScriptResult<()> {
        if !self.graphics.has_current_point() {
            return Err(self.err(ErrorKind::NoCurrentPoint));
        }

        let (Object::Bool(_), Object::String(idx)) = (self.peek(0)?, self.peek(1)?) else {
            return Err(self.typecheck());
        };

        let text = self.strings.get(*idx).as_bytes().to_vec();

        self.pop_n(2)?;
        self.graphics.charpath(&text)
    }

    fn stringwidth(&mut self) -> PostScriptResult<()> {
        let Object::String(idx) = self.peek(0)? else {
            return Err(self.typecheck());
        };

        let text = self.strings.get(*idx).as_bytes().to_vec();
        let extents = self.graphics.string_width(&text);

        self.pop()?;
        self.push(Object::Real(extents.x_advance))?;
        self.push(Object::Real(extents.y_advance))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{DEFAULT_HEIGHT, DEFAULT_WIDTH};

    fn run(source: &[u8]) -> Interpreter {
        let mut scanner = Scanner::from_bytes(source.to_vec());
        let mut interpreter = Interpreter::new(DEFAULT_WIDTH, DEFAULT_HEIGHT);

        while let Some(token) = scanner.get_token().unwrap() {
            interpreter.process_token(&mut scanner, token).unwrap();

            if interpreter.quit_requested() {
                break;
            }
        }

        interpreter
    }

    /// Runs until the first operator error, returning the machine state
    /// alongside the error
    fn run_err(source: &[u8]) -> (Interpreter, PostScriptError) {
        let mut scanner = Scanner::from_bytes(source.to_vec());
        let mut interpreter = Interpreter::new(DEFAULT_WIDTH, DEFAULT_HEIGHT);

        loop {
            match scanner.get_token().unwrap() {
                Some(token) => {
                    if let Err(err) = interpreter.process_token(&mut scanner, token) {
                        let err = err.downcast::<PostScriptError>().unwrap();
                        return (interpreter, err);
                    }
                }
                None => panic!("expected an error"),
            }
        }
    }

    fn err_kind(source: &[u8]) -> ErrorKind {
        run_err(source).1.kind()
    }

    fn pop_int(interpreter: &mut Interpreter) -> i32 {
        match interpreter.pop().unwrap() {
            Object::Integer(n) => n,
            other => panic!("expected an integer, found {:?}", other),
        }
    }

    fn pop_real(interpreter: &mut Interpreter) -> f64 {
        match interpreter.pop().unwrap() {
            Object::Real(v) => v,
            other => panic!("expected a real, found {:?}", other),
        }
    }

    fn pop_bool(interpreter: &mut Interpreter) -> bool {
        match interpreter.pop().unwrap() {
            Object::Bool(b) => b,
            other => panic!("expected a boolean, found {:?}", other),
        }
    }

    fn pop_string_bytes(interpreter: &mut Interpreter) -> Vec<u8> {
        match interpreter.pop().unwrap() {
            Object::String(idx) => interpreter.strings.get(idx).as_bytes().to_vec(),
            other => panic!("expected a string, found {:?}", other),
        }
    }

    fn assert_exhausted(interpreter: &mut Interpreter) {
        assert!(interpreter.pop().is_err());
    }

    fn assert_close(found: f64, expected: f64) {
        assert!(
            (found - expected).abs() < 1e-9,
            "{} != {}",
            found,
            expected
        );
    }

    // arithmetic

    #[test]
    fn add_two_integers() {
        let mut i = run(b"1 2 add");

        assert_eq!(i.pop().unwrap(), Object::Integer(3));
        assert_exhausted(&mut i);
    }

    #[test]
    fn add_real_and_integer() {
        let mut i = run(b"1.0 2 add");

        assert_eq!(i.pop().unwrap(), Object::Real(3.0));
        assert_exhausted(&mut i);
    }

    #[test]
    fn integer_overflow_spills_into_a_real() {
        let mut i = run(b"2147483647 1 add");

        assert_eq!(i.pop().unwrap(), Object::Real(2147483648.0));
    }

    #[test]
    fn div_is_always_real() {
        let mut i = run(b"6 2 div");

        assert_eq!(i.pop().unwrap(), Object::Real(3.0));
    }

    #[test]
    fn zero_divisors_fail() {
        assert_eq!(err_kind(b"1 0 div"), ErrorKind::RangeCheck);
        assert_eq!(err_kind(b"1 0 idiv"), ErrorKind::RangeCheck);
        assert_eq!(err_kind(b"1 0 mod"), ErrorKind::RangeCheck);
    }

    #[test]
    fn idiv_and_mod_demand_integers() {
        let mut i = run(b"7 2 idiv -7 3 mod");

        assert_eq!(pop_int(&mut i), -1);
        assert_eq!(pop_int(&mut i), 3);
        assert_eq!(err_kind(b"7 2.0 idiv"), ErrorKind::TypeCheck);
    }

    #[test]
    fn unary_math_preserves_operand_type() {
        let mut i = run(b"-5 abs 1.5 round");

        assert_eq!(i.pop().unwrap(), Object::Real(2.0));
        assert_eq!(i.pop().unwrap(), Object::Integer(5));
    }

    #[test]
    fn trig_works_in_degrees() {
        let mut i = run(b"30 sin 1 1 atan");

        assert_close(pop_real(&mut i), 45.0);
        assert_close(pop_real(&mut i), 0.5);
    }

    #[test]
    fn exp_raises_to_a_power() {
        let mut i = run(b"2 10 exp");

        assert_eq!(i.pop().unwrap(), Object::Real(1024.0));
    }

    #[test]
    fn rand_is_seeded_and_deterministic() {
        let mut i = run(b"5 srand rand 5 srand rand eq 123 srand rrand");

        assert_eq!(pop_int(&mut i), 123);
        assert!(pop_bool(&mut i));
    }

    // logic

    #[test]
    fn boolean_and_bitwise_forms() {
        let mut i = run(b"12 10 and true false or 5 not true not");

        assert!(!pop_bool(&mut i));
        assert_eq!(pop_int(&mut i), -6);
        assert!(pop_bool(&mut i));
        assert_eq!(pop_int(&mut i), 8);
        assert_eq!(err_kind(b"1 true and"), ErrorKind::TypeCheck);
    }

    #[test]
    fn bitshift_shifts_both_ways() {
        let mut i = run(b"1 3 bitshift 8 -3 bitshift");

        assert_eq!(pop_int(&mut i), 1);
        assert_eq!(pop_int(&mut i), 8);
    }

    // comparisons

    #[test]
    fn numbers_compare_across_representations() {
        let mut i = run(b"1 1.0 eq 1 2 le");

        assert!(pop_bool(&mut i));
        assert!(pop_bool(&mut i));
    }

    #[test]
    fn strings_compare_by_bytes() {
        let mut i = run(b"(abc) (abc) eq /a (a) eq (a) (b) lt");

        assert!(pop_bool(&mut i));
        assert!(pop_bool(&mut i));
        assert!(pop_bool(&mut i));
    }

    #[test]
    fn distinct_arrays_are_never_equal() {
        let mut i = run(b"[1] [1] eq");

        assert!(!pop_bool(&mut i));
    }

    #[test]
    fn ordering_needs_matching_types() {
        assert_eq!(err_kind(b"(a) 1 lt"), ErrorKind::TypeCheck);
    }

    // stack manipulation

    #[test]
    fn repeat_then_count() {
        let mut i = run(b"3 { 2 } repeat count");

        assert_eq!(pop_int(&mut i), 3);
        assert_eq!(pop_int(&mut i), 2);
        assert_eq!(pop_int(&mut i), 2);
        assert_eq!(pop_int(&mut i), 2);
        assert_exhausted(&mut i);
    }

    #[test]
    fn roll_rotates_the_window() {
        let mut i = run(b"1 2 3 4 5 5 -1 roll");

        assert_eq!(pop_int(&mut i), 1);
        assert_eq!(pop_int(&mut i), 5);
        assert_eq!(pop_int(&mut i), 4);
        assert_eq!(pop_int(&mut i), 3);
        assert_eq!(pop_int(&mut i), 2);
        assert_exhausted(&mut i);
    }

    #[test]
    fn copy_duplicates_the_top_run() {
        let mut i = run(b"(a) (b) (c) 2 copy");

        assert_eq!(pop_string_bytes(&mut i), b"c");
        assert_eq!(pop_string_bytes(&mut i), b"b");
        assert_eq!(pop_string_bytes(&mut i), b"c");
        assert_eq!(pop_string_bytes(&mut i), b"b");
        assert_eq!(pop_string_bytes(&mut i), b"a");
        assert_exhausted(&mut i);
    }

    #[test]
    fn index_reaches_into_the_stack() {
        let mut i = run(b"1 2 3 1 index");

        assert_eq!(pop_int(&mut i), 2);
        assert_eq!(err_kind(b"1 2 -1 index"), ErrorKind::RangeCheck);
        assert_eq!(err_kind(b"1 2 5 index"), ErrorKind::StackUnderflow);
    }

    #[test]
    fn exch_and_clear() {
        let mut i = run(b"1 2 exch");
        assert_eq!(pop_int(&mut i), 1);
        assert_eq!(pop_int(&mut i), 2);

        let mut i = run(b"1 2 clear count");
        assert_eq!(pop_int(&mut i), 0);
    }

    #[test]
    fn count_to_mark_measures_distance() {
        let mut i = run(b"mark 1 2 counttomark");

        assert_eq!(pop_int(&mut i), 2);
        assert_eq!(err_kind(b"1 counttomark"), ErrorKind::UnmatchedMark);
    }

    #[test]
    fn clear_to_mark_removes_the_mark_too() {
        let mut i = run(b"1 mark 2 3 cleartomark count");

        assert_eq!(pop_int(&mut i), 1);
    }

    #[test]
    fn operand_stack_capacity_is_bounded() {
        assert_eq!(err_kind(b"1 1 501 {} for"), ErrorKind::StackOverflow);
    }

    // names and dictionaries

    #[test]
    fn def_binds_in_the_current_dictionary() {
        let mut i = run(b"/x 10 def x x mul");

        assert_eq!(pop_int(&mut i), 100);
        assert_exhausted(&mut i);
    }

    #[test]
    fn dictionary_literals_resolve_keys() {
        let mut i = run(b"<< /a 1 /b 2 >> /a get");

        assert_eq!(pop_int(&mut i), 1);
        assert_exhausted(&mut i);
    }

    #[test]
    fn numeric_keys_canonicalize_by_type() {
        let mut i = run(b"<< 1 (int) 1.0 (real) >> dup 1 get exch 1.0 get");

        assert_eq!(pop_string_bytes(&mut i), b"real");
        assert_eq!(pop_string_bytes(&mut i), b"int");
    }

    #[test]
    fn begin_end_scopes_definitions() {
        let mut i = run(b"3 dict begin /x 7 def x end");
        assert_eq!(pop_int(&mut i), 7);

        let (_, err) = run_err(b"3 dict begin /x 7 def end x");
        assert_eq!(err.kind(), ErrorKind::Undefined);
    }

    #[test]
    fn end_cannot_pop_the_local_dictionary() {
        assert_eq!(err_kind(b"end"), ErrorKind::DictStackUnderflow);
    }

    #[test]
    fn undefined_names_report_themselves() {
        let (_, err) = run_err(b"florp");

        assert_eq!(err.kind(), ErrorKind::Undefined);
        assert_eq!(err.to_string(), "undefined in --florp--");
    }

    #[test]
    fn load_pushes_without_executing() {
        let mut i = run(b"/x 42 def /x load /add load");

        assert!(matches!(i.pop().unwrap(), Object::Operator(..)));
        assert_eq!(pop_int(&mut i), 42);
    }

    #[test]
    fn where_finds_builtins_in_the_system_dict() {
        let mut i = run(b"/moveto where");

        assert!(pop_bool(&mut i));
        assert_eq!(i.pop().unwrap(), Object::SystemDict);
    }

    #[test]
    fn where_finds_user_definitions() {
        let mut i = run(b"/q 1 def /q where");

        assert!(pop_bool(&mut i));
        assert!(matches!(i.pop().unwrap(), Object::Dictionary(..)));
    }

    #[test]
    fn where_misses_cleanly() {
        let mut i = run(b"/florp where");

        assert!(!pop_bool(&mut i));
        assert_exhausted(&mut i);
    }

    #[test]
    fn the_system_dictionary_is_read_only() {
        assert_eq!(
            err_kind(b"/add where pop /x 1 put"),
            ErrorKind::InvalidAccess
        );
    }

    #[test]
    fn the_system_dictionary_resolves_gets() {
        let mut i = run(b"/add where pop /add get");

        assert!(matches!(i.pop().unwrap(), Object::Operator(..)));
    }

    #[test]
    fn user_dictionaries_put_and_get() {
        let mut i = run(b"/d 4 dict def d /k 42 put d /k get d length");

        assert_eq!(pop_int(&mut i), 1);
        assert_eq!(pop_int(&mut i), 42);
    }

    #[test]
    fn dict_size_is_bounded() {
        assert_eq!(err_kind(b"-1 dict"), ErrorKind::RangeCheck);
    }

    // arrays and strings

    #[test]
    fn operators_inside_array_literals_execute() {
        let mut i = run(b"[1 2 add] aload pop");

        assert_eq!(pop_int(&mut i), 3);
        assert_exhausted(&mut i);
    }

    #[test]
    fn arrays_are_shared_references() {
        let mut i = run(b"/a 2 array def a 0 99 put a 0 get");

        assert_eq!(pop_int(&mut i), 99);
    }

    #[test]
    fn array_access_is_bounds_checked() {
        assert_eq!(err_kind(b"1 array 1 get"), ErrorKind::RangeCheck);
        assert_eq!(err_kind(b"[1 2] -1 get"), ErrorKind::RangeCheck);
        assert_eq!(err_kind(b"1 array dup 1 0 put"), ErrorKind::RangeCheck);
    }

    #[test]
    fn astore_fills_from_the_stack() {
        let mut i = run(b"1 2 3 3 array astore aload pop");

        assert_eq!(pop_int(&mut i), 3);
        assert_eq!(pop_int(&mut i), 2);
        assert_eq!(pop_int(&mut i), 1);
        assert_exhausted(&mut i);
    }

    #[test]
    fn string_allocation_is_bounded() {
        let mut i = run(b"5 string length");
        assert_eq!(pop_int(&mut i), 5);

        assert_eq!(err_kind(b"65537 string"), ErrorKind::RangeCheck);
        assert_eq!(err_kind(b"-1 string"), ErrorKind::RangeCheck);
    }

    #[test]
    fn string_bytes_put_and_get() {
        let mut i = run(b"(abc) dup 0 66 put 0 get");

        assert_eq!(pop_int(&mut i), 66);
        assert_eq!(err_kind(b"(abc) 5 get"), ErrorKind::RangeCheck);
    }

    #[test]
    fn cvs_round_trips_extreme_integers() {
        let mut i = run(b"-2147483648 32 string cvs");

        let bytes = pop_string_bytes(&mut i);
        assert_eq!(bytes.len(), 32);
        assert!(bytes.starts_with(b"-2147483648"));
    }

    #[test]
    fn cvs_trims_real_zeros() {
        let mut i = run(b"2.5 16 string cvs");

        assert!(pop_string_bytes(&mut i).starts_with(b"2.5\0"));
    }

    #[test]
    fn cvs_needs_room() {
        assert_eq!(err_kind(b"123 2 string cvs"), ErrorKind::RangeCheck);
    }

    #[test]
    fn cvs_stringifies_operators() {
        let mut i = run(b"/add load 8 string cvs");

        assert!(pop_string_bytes(&mut i).starts_with(b"add\0"));
    }

    #[test]
    fn cvx_makes_values_executable() {
        let mut i = run(b"[1 2] cvx exec");
        assert_eq!(pop_int(&mut i), 2);
        assert_eq!(pop_int(&mut i), 1);

        let mut i = run(b"/x cvx");
        assert!(matches!(i.pop().unwrap(), Object::Name(..)));

        assert_eq!(err_kind(b"(x) cvx"), ErrorKind::Unsupported);
    }

    // control flow

    #[test]
    fn if_runs_on_true_only() {
        let mut i = run(b"true { 42 } if");
        assert_eq!(pop_int(&mut i), 42);

        let mut i = run(b"false { 42 } if count");
        assert_eq!(pop_int(&mut i), 0);
    }

    #[test]
    fn ifelse_selects_a_branch() {
        let mut i = run(b"false { 1 } { 2 } ifelse");

        assert_eq!(pop_int(&mut i), 2);
    }

    #[test]
    fn for_sums_integer_controls() {
        let mut i = run(b"0 1 1 4 {add} for");

        assert_eq!(pop_int(&mut i), 10);
        assert_exhausted(&mut i);
    }

    #[test]
    fn for_with_exhausted_bounds_runs_zero_times() {
        let mut i = run(b"1 1 0 {} for count");
        assert_eq!(pop_int(&mut i), 0);

        let mut i = run(b"0 -1 1 {} for count");
        assert_eq!(pop_int(&mut i), 0);
    }

    #[test]
    fn for_counts_down_by_fractions() {
        let mut i = run(b"3 -.5 1 { } for");

        assert_eq!(pop_real(&mut i), 1.0);
        assert_eq!(pop_real(&mut i), 1.5);
        assert_eq!(pop_real(&mut i), 2.0);
        assert_eq!(pop_real(&mut i), 2.5);
        assert_eq!(pop_real(&mut i), 3.0);
        assert_exhausted(&mut i);
    }

    #[test]
    fn for_rejects_a_zero_increment() {
        assert_eq!(err_kind(b"1 0 5 {} for"), ErrorKind::RangeCheck);
    }

    #[test]
    fn repeat_rejects_negative_counts() {
        assert_eq!(err_kind(b"-1 {} repeat"), ErrorKind::RangeCheck);
    }

    #[test]
    fn exit_leaves_the_loop_immediately() {
        let mut i = run(b"1 1 1000000 { exit } for");

        assert_eq!(pop_int(&mut i), 1);
        assert_exhausted(&mut i);
    }

    #[test]
    fn exit_terminates_only_the_innermost_loop() {
        let mut i = run(
            b"0
              1 1 2 {
                  pop
                  1 1 5 { exit } for
                  pop
                  1 add
              } for",
        );

        assert_eq!(pop_int(&mut i), 2);
        assert_exhausted(&mut i);
    }

    #[test]
    fn quit_sets_the_termination_flag() {
        let mut i = run(b"1 quit 2");

        assert!(i.quit_requested());
        assert_eq!(pop_int(&mut i), 1);
        assert_exhausted(&mut i);
    }

    #[test]
    fn exec_runs_procedures() {
        let mut i = run(b"{ 1 2 } exec");

        assert_eq!(pop_int(&mut i), 2);
        assert_eq!(pop_int(&mut i), 1);
        assert_eq!(err_kind(b"(1 2) exec"), ErrorKind::Unsupported);
    }

    #[test]
    fn token_scans_without_executing() {
        let mut i = run(b"currentfile token x");

        assert!(pop_bool(&mut i));
        assert!(matches!(i.pop().unwrap(), Object::Name(..)));
        assert_exhausted(&mut i);
    }

    #[test]
    fn token_reports_an_empty_line() {
        let mut i = run(b"currentfile token");

        assert!(!pop_bool(&mut i));
    }

    #[test]
    fn names_inside_procedures_are_deferred() {
        // does not fail until the procedure actually runs
        run(b"/p { florp } def");

        let (_, err) = run_err(b"/p { florp } def p");
        assert_eq!(err.kind(), ErrorKind::Undefined);
    }

    // bind

    #[test]
    fn bound_procedures_ignore_rebinding() {
        let mut i = run(
            b"/inc { 1 add } bind def
              /add { pop pop 999 } def
              5 inc",
        );

        assert_eq!(pop_int(&mut i), 6);
    }

    #[test]
    fn bind_requires_a_procedure_and_leaves_it() {
        let mut i = run(b"{ add } bind");
        assert!(matches!(i.pop().unwrap(), Object::Procedure(..)));

        assert_eq!(err_kind(b"3 bind"), ErrorKind::TypeCheck);
    }

    // save and restore

    #[test]
    fn restore_rewinds_definitions() {
        let mut i = run(b"/x 1 def save /x 2 def restore x");

        assert_eq!(pop_int(&mut i), 1);
    }

    #[test]
    fn save_deep_copies_dictionaries() {
        let mut i = run(
            b"/d 2 dict def
              d /k 1 put
              save
              d /k 99 put
              restore
              d /k get",
        );

        assert_eq!(pop_int(&mut i), 1);
    }

    #[test]
    fn restore_needs_a_save_object() {
        assert_eq!(err_kind(b"3 restore"), ErrorKind::TypeCheck);
    }

    // vm state

    #[test]
    fn setglobal_tags_new_dictionaries() {
        let mut i = run(b"true setglobal 1 dict false setglobal 1 dict");

        let Object::Dictionary(local) = i.pop().unwrap() else {
            panic!("expected a dictionary");
        };
        let Object::Dictionary(global) = i.pop().unwrap() else {
            panic!("expected a dictionary");
        };

        assert_eq!(i.dictionaries.get(local).alloc(), AllocMode::Local);
        assert_eq!(i.dictionaries.get(global).alloc(), AllocMode::Global);
    }

    #[test]
    fn environment_probes() {
        let mut i = run(b"languagelevel product");

        assert_eq!(pop_string_bytes(&mut i), b"eps2pdf");
        assert_eq!(pop_int(&mut i), 1);
    }

    #[test]
    fn setpagedevice_resizes_the_page() {
        let i = run(b"<< /PageSize [100 200] >> setpagedevice");

        assert_eq!(i.graphics().page_size(), (100.0, 200.0));
    }

    #[test]
    fn dsc_comments_size_the_bounding_box() {
        let i = run(b"%%BoundingBox: 5 10 55 70\n1 pop");

        let bbox = i.bounding_box().unwrap();
        assert_eq!((bbox.x, bbox.y), (5.0, 10.0));
        assert_eq!((bbox.width, bbox.height), (50.0, 60.0));
    }

    // graphics operators

    #[test]
    fn paths_record_onto_pages() {
        let i = run(b"newpath 10 10 moveto 20 20 lineto stroke showpage");

        assert_eq!(i.graphics().page_count(), 1);
    }

    #[test]
    fn lineto_needs_a_current_point() {
        let (mut i, err) = run_err(b"1 2 lineto");

        assert_eq!(err.kind(), ErrorKind::NoCurrentPoint);
        // failed operators leave their operands in place
        assert_eq!(pop_int(&mut i), 2);
        assert_eq!(pop_int(&mut i), 1);
    }

    #[test]
    fn currentpoint_reports_user_coordinates() {
        let mut i = run(b"10 20 moveto 5 5 rmoveto currentpoint");

        assert_eq!(pop_real(&mut i), 25.0);
        assert_eq!(pop_real(&mut i), 15.0);
    }

    #[test]
    fn matrix_pushes_an_identity() {
        let mut i = run(b"matrix aload pop");

        assert_eq!(pop_real(&mut i), 0.0);
        assert_eq!(pop_real(&mut i), 0.0);
        assert_eq!(pop_real(&mut i), 1.0);
        assert_eq!(pop_real(&mut i), 0.0);
        assert_eq!(pop_real(&mut i), 0.0);
        assert_eq!(pop_real(&mut i), 1.0);
    }

    #[test]
    fn currentmatrix_reads_the_scaled_ctm() {
        let mut i = run(b"matrix currentmatrix aload pop");

        assert_close(pop_real(&mut i), 0.0);
        assert_close(pop_real(&mut i), 0.0);
        assert_close(pop_real(&mut i), 96.0 / 72.0);
        assert_close(pop_real(&mut i), 0.0);
        assert_close(pop_real(&mut i), 0.0);
        assert_close(pop_real(&mut i), 96.0 / 72.0);
    }

    #[test]
    fn scale_writes_into_a_supplied_matrix() {
        let mut i = run(b"2 3 matrix scale aload pop");

        assert_eq!(pop_real(&mut i), 0.0);
        assert_eq!(pop_real(&mut i), 0.0);
        assert_eq!(pop_real(&mut i), 3.0);
        assert_eq!(pop_real(&mut i), 0.0);
        assert_eq!(pop_real(&mut i), 0.0);
        assert_eq!(pop_real(&mut i), 2.0);
        assert_exhausted(&mut i);
    }

    #[test]
    fn identmatrix_overwrites_in_place() {
        let mut i = run(b"[9 9 9 9 9 9] identmatrix aload pop");

        assert_eq!(pop_real(&mut i), 0.0);
        assert_eq!(pop_real(&mut i), 0.0);
        assert_eq!(pop_real(&mut i), 1.0);
        assert_eq!(pop_real(&mut i), 0.0);
        assert_eq!(pop_real(&mut i), 0.0);
        assert_eq!(pop_real(&mut i), 1.0);
    }

    #[test]
    fn transform_applies_a_supplied_matrix() {
        let mut i = run(b"10 20 [2 0 0 3 5 7] transform");

        assert_eq!(pop_real(&mut i), 67.0);
        assert_eq!(pop_real(&mut i), 25.0);
    }

    #[test]
    fn itransform_inverts_the_mapping() {
        let mut i = run(b"25 67 [2 0 0 3 5 7] itransform");

        assert_close(pop_real(&mut i), 20.0);
        assert_close(pop_real(&mut i), 10.0);
    }

    #[test]
    fn dtransform_ignores_translation() {
        let mut i = run(b"10 20 [2 0 0 3 5 7] dtransform");

        assert_eq!(pop_real(&mut i), 60.0);
        assert_eq!(pop_real(&mut i), 20.0);
    }

    #[test]
    fn invertmatrix_writes_the_inverse() {
        let mut i = run(b"[2 0 0 2 0 0] matrix invertmatrix aload pop");

        assert_close(pop_real(&mut i), 0.0);
        assert_close(pop_real(&mut i), 0.0);
        assert_close(pop_real(&mut i), 0.5);
        assert_close(pop_real(&mut i), 0.0);
        assert_close(pop_real(&mut i), 0.0);
        assert_close(pop_real(&mut i), 0.5);
    }

    #[test]
    fn concatmatrix_multiplies_into_the_destination() {
        let mut i = run(b"[2 0 0 1 0 0] [1 0 0 3 0 0] matrix concatmatrix aload pop");

        assert_close(pop_real(&mut i), 0.0);
        assert_close(pop_real(&mut i), 0.0);
        assert_close(pop_real(&mut i), 3.0);
        assert_close(pop_real(&mut i), 0.0);
        assert_close(pop_real(&mut i), 0.0);
        assert_close(pop_real(&mut i), 2.0);
    }

    #[test]
    fn setmatrix_replaces_the_ctm() {
        let mut i = run(b"[1 0 0 1 5 5] setmatrix 0 0 transform");

        assert_close(pop_real(&mut i), 5.0);
        assert_close(pop_real(&mut i), 5.0);
    }

    #[test]
    fn gsave_grestore_rewinds_color() {
        let mut i = run(b"1 0 0 setrgbcolor gsave 0.5 setgray grestore currentrgbcolor");

        assert_close(pop_real(&mut i), 0.0);
        assert_close(pop_real(&mut i), 0.0);
        assert_close(pop_real(&mut i), 1.0);
    }

    #[test]
    fn color_model_readbacks_convert() {
        let mut i = run(b"0 1 0 setrgbcolor currentgray");
        assert_close(pop_real(&mut i), 0.59);

        let mut i = run(b"1 0 0 setrgbcolor currentcmykcolor");
        assert_close(pop_real(&mut i), 0.0); // k
        assert_close(pop_real(&mut i), 1.0); // y
        assert_close(pop_real(&mut i), 1.0); // m
        assert_close(pop_real(&mut i), 0.0); // c
    }

    #[test]
    fn dash_patterns_are_validated() {
        run(b"[2 4] 0 setdash [] 0 setdash");

        assert_eq!(err_kind(b"[0 0] 0 setdash"), ErrorKind::RangeCheck);
        assert_eq!(err_kind(b"[-1] 0 setdash"), ErrorKind::RangeCheck);
    }

    #[test]
    fn line_style_parameters_round_trip() {
        let mut i = run(b"1 setlinecap 2 setlinejoin currentlinecap currentlinejoin");

        assert_eq!(pop_int(&mut i), 2);
        assert_eq!(pop_int(&mut i), 1);
        assert_eq!(err_kind(b"3 setlinecap"), ErrorKind::RangeCheck);
        assert_eq!(err_kind(b"0.5 setmiterlimit"), ErrorKind::RangeCheck);
    }

    // text

    #[test]
    fn the_font_pipeline_draws_text() {
        let i = run(
            b"/Helvetica findfont 12 scalefont setfont
              10 10 moveto (hi) show showpage",
        );

        assert_eq!(i.graphics().page_count(), 1);
    }

    #[test]
    fn show_needs_a_current_point() {
        let (_, err) = run_err(b"(hi) show");

        assert_eq!(err.kind(), ErrorKind::NoCurrentPoint);
    }

    #[test]
    fn stringwidth_reports_advances() {
        let mut i = run(b"/Courier 10 selectfont (ab) stringwidth");

        assert_close(pop_real(&mut i), 0.0);
        assert_close(pop_real(&mut i), 12.0);
    }

    #[test]
    fn selectfont_restores_operands_on_failure() {
        let (mut i, err) = run_err(b"/Courier (x) selectfont");

        assert_eq!(err.kind(), ErrorKind::TypeCheck);
        assert_eq!(pop_string_bytes(&mut i), b"x");
        assert!(matches!(i.pop().unwrap(), Object::Literal(..)));
    }

    #[test]
    fn scalefont_rejects_negative_sizes() {
        assert_eq!(
            err_kind(b"/Courier findfont -1 scalefont"),
            ErrorKind::RangeCheck
        );
    }

    #[test]
    fn unknown_fonts_fall_back_to_times() {
        let mut i = run(b"/NoSuchFace findfont");

        let Object::Font(idx) = i.pop().unwrap() else {
            panic!("expected a font");
        };

        assert_eq!(i.fonts.get(idx).family, "Times New Roman");
    }

    #[test]
    fn charpath_builds_a_strokable_outline() {
        let i = run(
            b"/Courier 10 selectfont
              10 10 moveto (hi) false charpath stroke showpage",
        );

        assert_eq!(i.graphics().page_count(), 1);
    }
}
