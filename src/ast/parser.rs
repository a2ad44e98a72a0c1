/// Builder-text parser.
///
/// Parses the call-chain syntax that the serializer emits (and that users
/// type into the editor) into a small syntax tree. Nothing here knows what
/// `XQL`, `c` or `F` mean; the evaluator gives the tree its meaning.
///
/// ```text
/// program  := ws binding* ("return" ws)? expr ws ";"? ws
/// binding  := ("const" | "let") ws ident ws "=" ws expr ws ";" ws
/// expr     := primary (ws "." ws ident ws args)*
/// primary  := string | number | ident ws args? | "(" ws expr ws ")"
/// number   := "NaN" | "-"? "Infinity" | "-"? digits ("." digits)? (("e" | "E") ("+" | "-")? digits)?
/// args     := "(" ws (expr (ws "," ws expr)* ws ","?)? ws ")"
/// ```
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{
        alpha1, alphanumeric1, char, digit1, multispace1, not_line_ending, one_of,
    },
    combinator::{all_consuming, cut, map, map_res, opt, recognize, verify},
    error::{Error as NomError, ErrorKind},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

use crate::error::{Error, Result};

/// Deepest nesting accepted, counting parentheses, call arguments and
/// chained method calls.
pub const MAX_DEPTH: usize = 256;

/// Syntax tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// A bare name: a binding, or a namespace such as `XQL` or `F`.
    Ident(String),
    /// `name(args)` or `target.name(args)`.
    Call {
        target: Option<Box<Node>>,
        name: String,
        args: Vec<Node>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: String,
    pub value: Node,
}

/// A parsed builder-text program: setup bindings and the final expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub bindings: Vec<Binding>,
    pub body: Node,
}

/// Parse builder text into a [`Program`].
pub fn parse_program(input: &str) -> Result<Program> {
    match all_consuming(program)(input) {
        Ok((_, program)) => Ok(program),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let position = input.len() - e.input.len();
            if e.code == ErrorKind::TooLarge {
                return Err(Error::parse(
                    position,
                    format!("expression nested deeper than {} levels", MAX_DEPTH),
                ));
            }
            Err(Error::parse(position, describe(e.input)))
        }
        Err(nom::Err::Incomplete(_)) => Err(Error::parse(input.len(), "unexpected end of input")),
    }
}

fn describe(rest: &str) -> String {
    let snippet: String = rest.chars().take(20).collect();
    if snippet.is_empty() {
        "unexpected end of input".to_string()
    } else {
        format!("unexpected input near '{}'", snippet)
    }
}

fn program(input: &str) -> IResult<&str, Program> {
    let (input, _) = ws(input)?;
    let (input, bindings) = many0(binding)(input)?;
    let (input, _) = opt(terminated(keyword("return"), ws))(input)?;
    let (input, body) = expr(input, 0)?;
    let (input, _) = tuple((ws, opt(char(';')), ws))(input)?;
    Ok((input, Program { bindings, body }))
}

fn binding(input: &str) -> IResult<&str, Binding> {
    let (input, _) = alt((keyword("const"), keyword("let")))(input)?;
    let (input, (_, name, _, _, _, value, _, _, _)) = cut(tuple((
        ws,
        identifier,
        ws,
        char('='),
        ws,
        |i| expr(i, 0),
        ws,
        char(';'),
        ws,
    )))(input)?;
    Ok((
        input,
        Binding {
            name: name.to_string(),
            value,
        },
    ))
}

/// Whitespace and `//` line comments.
fn ws(input: &str) -> IResult<&str, ()> {
    map(
        many0(alt((
            multispace1,
            recognize(pair(tag("//"), not_line_ending)),
        ))),
        |_| (),
    )(input)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))(input)
}

fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    move |input: &'a str| verify(identifier, |ident: &str| ident == word)(input)
}

fn expr(input: &str, depth: usize) -> IResult<&str, Node> {
    if depth > MAX_DEPTH {
        return Err(nom::Err::Failure(NomError::new(input, ErrorKind::TooLarge)));
    }
    let (mut input, mut node) = primary(input, depth)?;
    let mut depth = depth;
    loop {
        let step: IResult<&str, (&str, Vec<Node>)> = preceded(
            tuple((ws, char('.'), ws)),
            cut(pair(identifier, preceded(ws, |i| args(i, depth)))),
        )(input);
        match step {
            Ok((rest, (name, args))) => {
                depth += 1;
                if depth > MAX_DEPTH {
                    return Err(nom::Err::Failure(NomError::new(input, ErrorKind::TooLarge)));
                }
                node = Node::Call {
                    target: Some(Box::new(node)),
                    name: name.to_string(),
                    args,
                };
                input = rest;
            }
            Err(nom::Err::Error(_)) => return Ok((input, node)),
            Err(e) => return Err(e),
        }
    }
}

fn primary(input: &str, depth: usize) -> IResult<&str, Node> {
    alt((
        map(string_literal, Node::Str),
        number,
        |i| name_or_call(i, depth),
        delimited(
            pair(char('('), ws),
            cut(|i| expr(i, depth + 1)),
            cut(pair(ws, char(')'))),
        ),
    ))(input)
}

fn name_or_call(input: &str, depth: usize) -> IResult<&str, Node> {
    let (input, name) = identifier(input)?;
    let (input, args) = opt(preceded(ws, |i| args(i, depth)))(input)?;
    let node = match (name, args) {
        (_, Some(args)) => Node::Call {
            target: None,
            name: name.to_string(),
            args,
        },
        ("true", None) => Node::Bool(true),
        ("false", None) => Node::Bool(false),
        (_, None) => Node::Ident(name.to_string()),
    };
    Ok((input, node))
}

fn args(input: &str, depth: usize) -> IResult<&str, Vec<Node>> {
    preceded(
        pair(char('('), ws),
        cut(terminated(
            separated_list0(tuple((ws, char(','), ws)), |i| expr(i, depth + 1)),
            tuple((ws, opt(pair(char(','), ws)), char(')'))),
        )),
    )(input)
}

/// Integers, decimals with an optional exponent, `NaN` and `Infinity`.
fn number(input: &str) -> IResult<&str, Node> {
    alt((
        map(keyword("NaN"), |_| Node::Float(f64::NAN)),
        map(pair(opt(char('-')), keyword("Infinity")), |(sign, _)| {
            Node::Float(if sign.is_some() {
                f64::NEG_INFINITY
            } else {
                f64::INFINITY
            })
        }),
        map_res(
            recognize(tuple((
                opt(char('-')),
                digit1,
                opt(pair(char('.'), digit1)),
                opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
            ))),
            |s: &str| -> std::result::Result<Node, ()> {
                if s.contains(['.', 'e', 'E']) {
                    s.parse::<f64>().map(Node::Float).map_err(|_| ())
                } else {
                    s.parse::<i64>().map(Node::Int).map_err(|_| ())
                }
            },
        ),
    ))(input)
}

fn string_literal(input: &str) -> IResult<&str, String> {
    alt((quoted('"'), quoted('\'')))(input)
}

/// A string in `quote`s with backslash escapes.
fn quoted<'a>(quote: char) -> impl FnMut(&'a str) -> IResult<&'a str, String> {
    move |input: &'a str| {
        let (body, _) = char(quote)(input)?;
        let mut out = String::new();
        let mut chars = body.char_indices();
        while let Some((i, ch)) = chars.next() {
            if ch == quote {
                return Ok((&body[i + ch.len_utf8()..], out));
            }
            if ch != '\\' {
                out.push(ch);
                continue;
            }
            match chars.next() {
                Some((_, 'n')) => out.push('\n'),
                Some((_, 't')) => out.push('\t'),
                Some((_, 'r')) => out.push('\r'),
                Some((_, other)) => out.push(other),
                None => break,
            }
        }
        Err(nom::Err::Failure(NomError::new(input, ErrorKind::Char)))
    }
}
