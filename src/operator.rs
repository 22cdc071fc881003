/// Dispatch identity of a built-in operator. The interpreter matches on
/// this to reach the handler; several table entries may share a kind (the
/// historical `setcmybcolor` spelling aliases `setcmykcolor`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OpKind {
    /// pops an object from the operand stack and writes a text
    /// representation of it to standard output
    ///
    /// any `=` –
    PrintTop,

    /// like `=`, but intended for the syntactic form of the object
    ///
    /// any `==` –
    PrintAndPop,

    Abs,

    /// returns the sum of num1 and num2. If both operands are integers and
    /// the result is within integer range, the result is an integer;
    /// otherwise, the result is a real number
    ///
    /// num1 num2 `add` sum
    Add,

    /// successively pushes all the elements of array on the operand stack,
    /// and finally pushes array itself
    ///
    /// array `aload` a0 … an-1 array
    Aload,

    /// returns the logical conjunction of boolean operands, or the bitwise
    /// "and" of integer operands
    And,

    Arc,
    ArcN,
    Array,

    /// stores the top n objects from the operand stack into array, where n
    /// is the length of array, and leaves array on the stack
    ///
    /// any0 … anyn-1 array `astore` array
    Astore,

    Atan,

    /// pushes dict on the dictionary stack, making it the current
    /// dictionary
    ///
    /// dict `begin` –
    Begin,

    /// replaces executable operator names in proc by their values. For each
    /// element of proc that is an executable name whose value is an
    /// operator, bind replaces the name with the operator object. Nested
    /// procedures are bound recursively.
    ///
    /// proc `bind` proc
    Bind,

    Bitshift,
    Ceiling,
    Charpath,
    Clear,
    ClearToMark,
    Clip,
    ClipPath,
    ClosePath,
    Concat,
    ConcatMatrix,

    /// pops n from the stack and duplicates the top n elements. Only the
    /// integer form is supported; composite copy is not implemented.
    ///
    /// any1 … anyn n `copy` any1 … anyn any1 … anyn
    Copy,

    Cos,
    Count,

    /// counts the number of objects on the stack above the topmost mark
    ///
    /// mark obj1 … objn `counttomark` mark obj1 … objn n
    CountToMark,

    CurrentCmykColor,
    CurrentDict,
    CurrentFile,
    CurrentFlat,
    CurrentGray,
    CurrentLineCap,
    CurrentLineJoin,
    CurrentLineWidth,
    CurrentMatrix,
    CurrentMiterLimit,
    CurrentPoint,
    CurrentRgbColor,
    CurveTo,

    /// converts an arbitrary object to its text representation, stored
    /// into the supplied string, which must be long enough
    ///
    /// any string `cvs` substring
    Cvs,

    /// (convert to executable) makes the object on the top of the operand
    /// stack executable: a literal name becomes an executable name, an
    /// array becomes a procedure
    ///
    /// any `cvx` any
    Cvx,

    /// associates key with value in the current dictionary, the one on the
    /// top of the dictionary stack
    ///
    /// key value `def` –
    Def,

    DefaultMatrix,

    /// creates an empty dictionary with an initial capacity of int
    /// elements and pushes it on the operand stack
    ///
    /// int `dict` dict
    Dict,

    /// divides num1 by num2, producing a result that is always a real
    /// number even if both operands are integers
    ///
    /// num1 num2 `div` quotient
    Div,

    DTransform,
    Dup,

    /// pops the dictionary stack, restoring the previous current
    /// dictionary. The bottom-most (local) dictionary cannot be popped.
    ///
    /// – `end` –
    End,

    EoFill,
    Eq,
    ErasePage,
    Exch,
    Exec,

    /// terminates execution of the innermost active looping context
    ///
    /// – `exit` –
    Exit,

    Exp,
    Fill,

    /// obtains a font whose name is key, mapping the standard font names
    /// onto the backend faces and falling back to Times for unknown names
    ///
    /// key `findfont` font
    FindFont,

    FlattenPath,
    Floor,

    /// executes proc repeatedly, passing it a sequence of control values
    /// from initial by steps of increment to limit. The control value is
    /// an integer only if both initial and increment are integers. A zero
    /// increment would loop forever and fails instead.
    ///
    /// initial increment limit proc `for` –
    For,

    Ge,

    /// fetches a single element: by index from an array or string, by key
    /// from a dictionary
    ///
    /// array index `get` any
    /// dict key `get` any
    /// string index `get` int
    Get,

    GRestore,
    GSave,
    Gt,
    IdentMatrix,

    /// divides int1 by int2 and returns the integer part of the quotient.
    /// Both operands must be integers.
    ///
    /// int1 int2 `idiv` quotient
    Idiv,

    IdTransform,
    If,
    IfElse,
    Index,
    InitMatrix,
    InvertMatrix,
    ITransform,
    LanguageLevel,
    Le,
    Length,
    LineTo,
    Ln,

    /// searches the dictionary stack for key and pushes the associated
    /// value, without executing it
    ///
    /// key `load` value
    Load,

    Log,
    Lt,
    Mark,

    /// pushes a six-element identity matrix array
    ///
    /// – `matrix` matrix
    Matrix,

    Mod,
    MoveTo,
    Mul,
    Ne,
    Neg,
    NewPath,
    Not,
    Or,
    Pop,
    Product,
    PStack,

    /// replaces a single element of the first operand: by index in an
    /// array or string, by key in a dictionary
    ///
    /// array index any `put` –
    /// dict key any `put` –
    /// string index int `put` –
    Put,

    Quit,
    Rand,
    RCurveTo,
    RectFill,
    RectStroke,

    /// executes proc n times; n must be a non-negative integer
    ///
    /// n proc `repeat` –
    Repeat,

    /// resets the dictionary stack to the state captured by the save
    /// object, and restores the paired graphics state
    ///
    /// save `restore` –
    Restore,

    RLineTo,
    RMoveTo,
    Roll,
    Rotate,
    Round,
    RRand,

    /// snapshots the dictionary stack (deep-copying every user dictionary)
    /// and the graphics state, and pushes a save object representing the
    /// snapshot
    ///
    /// – `save` save
    Save,

    Scale,
    ScaleFont,
    SelectFont,
    SetCmykColor,
    SetDash,
    SetFlat,
    SetFont,
    SetGlobal,
    SetGray,
    SetLineCap,
    SetLineJoin,
    SetLineWidth,
    SetMatrix,
    SetMiterLimit,
    SetPageDevice,
    SetRgbColor,
    Show,
    ShowPage,
    Sin,
    Sqrt,
    SRand,
    Stack,
    Start,
    String,
    StringWidth,
    Stroke,
    Sub,
    Token,
    Transform,
    Translate,
    Truncate,
    Version,
    Where,
    Xor,
}

/// One entry of the built-in operator table.
///
/// `arity` is the minimum operand-stack depth required before the handler
/// runs; when `numeric` is set, each of those operands must additionally
/// be a number or the dispatcher raises a typecheck.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Operator {
    pub name: &'static str,
    pub arity: usize,
    pub numeric: bool,
    pub kind: OpKind,
}

const fn op(name: &'static str, arity: usize, numeric: bool, kind: OpKind) -> Operator {
    Operator {
        name,
        arity,
        numeric,
        kind,
    }
}

/// The system dictionary proper: lexically sorted so lookup can binary
/// search by name. `true`, `false`, and `null` are resolved out-of-band
/// when the search misses.
pub(crate) static OPERATORS: &[Operator] = &[
    op("=", 1, false, OpKind::PrintTop),
    op("==", 1, false, OpKind::PrintAndPop),
    op("abs", 1, true, OpKind::Abs),
    op("add", 2, true, OpKind::Add),
    op("aload", 1, false, OpKind::Aload),
    op("and", 2, false, OpKind::And),
    op("arc", 5, true, OpKind::Arc),
    op("arcn", 5, true, OpKind::ArcN),
    op("array", 1, true, OpKind::Array),
    op("astore", 2, false, OpKind::Astore),
    op("atan", 2, true, OpKind::Atan),
    op("begin", 1, false, OpKind::Begin),
    op("bind", 1, false, OpKind::Bind),
    op("bitshift", 2, false, OpKind::Bitshift),
    op("ceiling", 1, true, OpKind::Ceiling),
    op("charpath", 2, false, OpKind::Charpath),
    op("clear", 0, false, OpKind::Clear),
    op("cleartomark", 1, false, OpKind::ClearToMark),
    op("clip", 0, false, OpKind::Clip),
    op("clippath", 0, false, OpKind::ClipPath),
    op("closepath", 0, false, OpKind::ClosePath),
    op("concat", 1, false, OpKind::Concat),
    op("concatmatrix", 3, false, OpKind::ConcatMatrix),
    op("copy", 1, true, OpKind::Copy),
    op("cos", 1, true, OpKind::Cos),
    op("count", 0, false, OpKind::Count),
    op("counttomark", 1, false, OpKind::CountToMark),
    op("currentcmykcolor", 0, false, OpKind::CurrentCmykColor),
    op("currentdict", 0, false, OpKind::CurrentDict),
    op("currentfile", 0, false, OpKind::CurrentFile),
    op("currentflat", 0, false, OpKind::CurrentFlat),
    op("currentgray", 0, false, OpKind::CurrentGray),
    op("currentlinecap", 0, false, OpKind::CurrentLineCap),
    op("currentlinejoin", 0, false, OpKind::CurrentLineJoin),
    op("currentlinewidth", 0, false, OpKind::CurrentLineWidth),
    op("currentmatrix", 1, false, OpKind::CurrentMatrix),
    op("currentmiterlimit", 0, false, OpKind::CurrentMiterLimit),
    op("currentpoint", 0, false, OpKind::CurrentPoint),
    op("currentrgbcolor", 0, false, OpKind::CurrentRgbColor),
    op("curveto", 6, true, OpKind::CurveTo),
    op("cvs", 2, false, OpKind::Cvs),
    op("cvx", 1, false, OpKind::Cvx),
    op("def", 2, false, OpKind::Def),
    op("defaultmatrix", 1, false, OpKind::DefaultMatrix),
    op("dict", 1, true, OpKind::Dict),
    op("div", 2, true, OpKind::Div),
    op("dtransform", 2, false, OpKind::DTransform),
    op("dup", 1, false, OpKind::Dup),
    op("end", 0, false, OpKind::End),
    op("eofill", 0, false, OpKind::EoFill),
    op("eq", 2, false, OpKind::Eq),
    op("erasepage", 0, false, OpKind::ErasePage),
    op("exch", 2, false, OpKind::Exch),
    op("exec", 1, false, OpKind::Exec),
    op("exit", 0, false, OpKind::Exit),
    op("exp", 2, true, OpKind::Exp),
    op("fill", 0, false, OpKind::Fill),
    op("findfont", 1, false, OpKind::FindFont),
    op("flattenpath", 0, false, OpKind::FlattenPath),
    op("floor", 1, true, OpKind::Floor),
    op("for", 4, false, OpKind::For),
    op("ge", 2, false, OpKind::Ge),
    op("get", 2, false, OpKind::Get),
    op("grestore", 0, false, OpKind::GRestore),
    op("gsave", 0, false, OpKind::GSave),
    op("gt", 2, false, OpKind::Gt),
    op("identmatrix", 1, false, OpKind::IdentMatrix),
    op("idiv", 2, true, OpKind::Idiv),
    op("idtransform", 2, false, OpKind::IdTransform),
    op("if", 2, false, OpKind::If),
    op("ifelse", 3, false, OpKind::IfElse),
    op("index", 2, false, OpKind::Index),
    op("initmatrix", 0, false, OpKind::InitMatrix),
    op("invertmatrix", 2, false, OpKind::InvertMatrix),
    op("itransform", 2, false, OpKind::ITransform),
    op("languagelevel", 0, false, OpKind::LanguageLevel),
    op("le", 2, false, OpKind::Le),
    op("length", 1, false, OpKind::Length),
    op("lineto", 2, true, OpKind::LineTo),
    op("ln", 1, true, OpKind::Ln),
    op("load", 1, false, OpKind::Load),
    op("log", 1, true, OpKind::Log),
    op("lt", 2, false, OpKind::Lt),
    op("mark", 0, false, OpKind::Mark),
    op("matrix", 0, false, OpKind::Matrix),
    op("mod", 2, true, OpKind::Mod),
    op("moveto", 2, true, OpKind::MoveTo),
    op("mul", 2, true, OpKind::Mul),
    op("ne", 2, false, OpKind::Ne),
    op("neg", 1, true, OpKind::Neg),
    op("newpath", 0, false, OpKind::NewPath),
    op("not", 1, false, OpKind::Not),
    op("or", 2, false, OpKind::Or),
    op("pop", 1, false, OpKind::Pop),
    op("product", 0, false, OpKind::Product),
    op("pstack", 0, false, OpKind::PStack),
    op("put", 3, false, OpKind::Put),
    op("quit", 0, false, OpKind::Quit),
    op("rand", 0, false, OpKind::Rand),
    op("rcurveto", 6, true, OpKind::RCurveTo),
    op("rectfill", 4, true, OpKind::RectFill),
    op("rectstroke", 4, true, OpKind::RectStroke),
    op("repeat", 2, false, OpKind::Repeat),
    op("restore", 1, false, OpKind::Restore),
    op("rlineto", 2, true, OpKind::RLineTo),
    op("rmoveto", 2, true, OpKind::RMoveTo),
    op("roll", 2, true, OpKind::Roll),
    op("rotate", 1, false, OpKind::Rotate),
    op("round", 1, true, OpKind::Round),
    op("rrand", 0, false, OpKind::RRand),
    op("save", 0, false, OpKind::Save),
    op("scale", 2, false, OpKind::Scale),
    op("scalefont", 1, true, OpKind::ScaleFont),
    op("selectfont", 2, false, OpKind::SelectFont),
    op("setcmybcolor", 4, true, OpKind::SetCmykColor),
    op("setcmykcolor", 4, true, OpKind::SetCmykColor),
    op("setdash", 2, false, OpKind::SetDash),
    op("setflat", 1, true, OpKind::SetFlat),
    op("setfont", 1, false, OpKind::SetFont),
    op("setglobal", 1, false, OpKind::SetGlobal),
    op("setgray", 1, true, OpKind::SetGray),
    op("setlinecap", 1, true, OpKind::SetLineCap),
    op("setlinejoin", 1, true, OpKind::SetLineJoin),
    op("setlinewidth", 1, true, OpKind::SetLineWidth),
    op("setmatrix", 1, false, OpKind::SetMatrix),
    op("setmiterlimit", 1, true, OpKind::SetMiterLimit),
    op("setpagedevice", 1, false, OpKind::SetPageDevice),
    op("setrgbcolor", 3, true, OpKind::SetRgbColor),
    op("show", 1, false, OpKind::Show),
    op("showpage", 0, false, OpKind::ShowPage),
    op("sin", 1, true, OpKind::Sin),
    op("sqrt", 1, true, OpKind::Sqrt),
    op("srand", 1, true, OpKind::SRand),
    op("stack", 1, false, OpKind::Stack),
    op("start", 0, false, OpKind::Start),
    op("string", 1, true, OpKind::String),
    op("stringwidth", 1, false, OpKind::StringWidth),
    op("stroke", 0, false, OpKind::Stroke),
    op("sub", 2, true, OpKind::Sub),
    op("token", 1, false, OpKind::Token),
    op("transform", 2, false, OpKind::Transform),
    op("translate", 2, false, OpKind::Translate),
    op("truncate", 1, true, OpKind::Truncate),
    op("version", 0, false, OpKind::Version),
    op("where", 1, false, OpKind::Where),
    op("xor", 2, false, OpKind::Xor),
];

pub(crate) fn lookup(name: &[u8]) -> Option<&'static Operator> {
    OPERATORS
        .binary_search_by(|entry| entry.name.as_bytes().cmp(name))
        .ok()
        .map(|idx| &OPERATORS[idx])
}

pub(crate) fn table_len() -> usize {
    OPERATORS.len()
}
