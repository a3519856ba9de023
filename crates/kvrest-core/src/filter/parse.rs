use crate::filter::{
    ByteComparator, ColumnRange, CompareOp, Filter, FilterParseError, SingleColumnValue,
    token::{Token, TokenKind, tokenize},
};
use regex::bytes::Regex;

///
/// Filter grammar
///
/// expr     := and_expr ( "OR" and_expr )*
/// and_expr := unary ( "AND" unary )*
/// unary    := ( "SKIP" | "WHILE" ) unary | primary
/// primary  := "(" expr ")" | NAME "(" [ arg ( "," arg )* ] ")"
///

/// Parse filter bytes into a [`Filter`].
pub fn parse_filter(input: &[u8]) -> Result<Filter, FilterParseError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(FilterParseError::Empty);
    }
    check_balanced(&tokens)?;

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let filter = parser.parse_or()?;

    match parser.peek() {
        None => Ok(filter),
        Some(token) => Err(unexpected(token)),
    }
}

// Parenthesis balance is checked up front so that imbalance is reported as
// such rather than as whatever token the descent trips over first.
fn check_balanced(tokens: &[Token]) -> Result<(), FilterParseError> {
    let mut open = Vec::new();

    for token in tokens {
        match token.kind {
            TokenKind::LParen => open.push(token.offset),
            TokenKind::RParen => {
                if open.pop().is_none() {
                    return Err(FilterParseError::UnbalancedParens {
                        offset: token.offset,
                    });
                }
            }
            _ => {}
        }
    }

    match open.pop() {
        Some(offset) => Err(FilterParseError::UnbalancedParens { offset }),
        None => Ok(()),
    }
}

// Words in operator position are reported as unknown operators.
fn unexpected(token: &Token) -> FilterParseError {
    match &token.kind {
        TokenKind::Word(name) if name.bytes().all(|b| b.is_ascii_uppercase()) => {
            FilterParseError::UnknownOperator {
                name: name.clone(),
                offset: token.offset,
            }
        }
        kind => FilterParseError::UnexpectedToken {
            offset: token.offset,
            found: kind.describe(),
        },
    }
}

///
/// Arg
/// One argument of a filter call.
///

#[derive(Clone, Debug)]
enum Arg {
    Bytes(Vec<u8>),
    Int(i64),
    Bool(bool),
    Op(CompareOp),
}

/// Deepest nesting of parentheses and SKIP/WHILE prefixes accepted.
pub const MAX_FILTER_DEPTH: usize = 64;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Result<Token, FilterParseError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or(FilterParseError::UnexpectedEnd)?;
        self.pos += 1;

        Ok(token)
    }

    fn peek_word(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Token { kind: TokenKind::Word(w), .. }) if w == word)
    }

    fn expect(&mut self, expected: &TokenKind) -> Result<(), FilterParseError> {
        let token = self.next()?;
        if &token.kind == expected {
            Ok(())
        } else {
            Err(unexpected(&token))
        }
    }

    fn parse_or(&mut self) -> Result<Filter, FilterParseError> {
        let mut members = vec![self.parse_and()?];
        while self.peek_word("OR") {
            self.pos += 1;
            members.push(self.parse_and()?);
        }

        Ok(fold(members, Filter::Or))
    }

    fn parse_and(&mut self) -> Result<Filter, FilterParseError> {
        let mut members = vec![self.parse_unary()?];
        while self.peek_word("AND") {
            self.pos += 1;
            members.push(self.parse_unary()?);
        }

        Ok(fold(members, Filter::And))
    }

    // Runs `f` one nesting level down; `offset` locates the opening token.
    fn nested<T>(
        &mut self,
        offset: usize,
        f: impl FnOnce(&mut Self) -> Result<T, FilterParseError>,
    ) -> Result<T, FilterParseError> {
        if self.depth >= MAX_FILTER_DEPTH {
            return Err(FilterParseError::TooDeep {
                offset,
                max: MAX_FILTER_DEPTH,
            });
        }

        self.depth += 1;
        let result = f(self);
        self.depth -= 1;

        result
    }

    fn parse_unary(&mut self) -> Result<Filter, FilterParseError> {
        let offset = self.peek().map_or(0, |token| token.offset);

        if self.peek_word("SKIP") {
            self.pos += 1;
            let inner = self.nested(offset, Self::parse_unary)?;
            return Ok(Filter::Skip(Box::new(inner)));
        }
        if self.peek_word("WHILE") {
            self.pos += 1;
            let inner = self.nested(offset, Self::parse_unary)?;
            return Ok(Filter::While(Box::new(inner)));
        }

        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Filter, FilterParseError> {
        let token = self.next()?;

        match token.kind {
            TokenKind::LParen => {
                let inner = self.nested(token.offset, Self::parse_or)?;
                self.expect(&TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::Word(name) => {
                self.expect(&TokenKind::LParen)?;
                let args = self.parse_args()?;
                build_filter(&name, token.offset, args)
            }
            kind => Err(FilterParseError::UnexpectedToken {
                offset: token.offset,
                found: kind.describe(),
            }),
        }
    }

    // Consumes arguments through the closing parenthesis.
    fn parse_args(&mut self) -> Result<Vec<Arg>, FilterParseError> {
        let mut args = Vec::new();

        if matches!(self.peek(), Some(Token { kind: TokenKind::RParen, .. })) {
            self.pos += 1;
            return Ok(args);
        }

        loop {
            let token = self.next()?;
            let arg = match token.kind {
                TokenKind::Quoted(bytes) => Arg::Bytes(bytes),
                TokenKind::Int(n) => Arg::Int(n),
                TokenKind::Op(op) => Arg::Op(op),
                TokenKind::Word(ref word) if word.eq_ignore_ascii_case("true") => Arg::Bool(true),
                TokenKind::Word(ref word) if word.eq_ignore_ascii_case("false") => {
                    Arg::Bool(false)
                }
                kind => {
                    return Err(FilterParseError::UnexpectedToken {
                        offset: token.offset,
                        found: kind.describe(),
                    });
                }
            };
            args.push(arg);

            let token = self.next()?;
            match token.kind {
                TokenKind::Comma => {}
                TokenKind::RParen => return Ok(args),
                _ => return Err(unexpected(&token)),
            }
        }
    }
}

fn fold(mut members: Vec<Filter>, list: fn(Vec<Filter>) -> Filter) -> Filter {
    if members.len() == 1 {
        members.remove(0)
    } else {
        list(members)
    }
}

//
// Filter construction
//

fn build_filter(name: &str, offset: usize, args: Vec<Arg>) -> Result<Filter, FilterParseError> {
    let mut args = Args::new(name, args);

    let filter = match name {
        "KeyOnlyFilter" => Filter::KeyOnly,
        "FirstKeyOnlyFilter" => Filter::FirstKeyOnly,
        "PrefixFilter" => Filter::Prefix(args.bytes()?),
        "ColumnPrefixFilter" => Filter::ColumnPrefix(args.bytes()?),
        "MultipleColumnPrefixFilter" => {
            let mut prefixes = Vec::new();
            while !args.is_exhausted() {
                prefixes.push(args.bytes()?);
            }
            if prefixes.is_empty() {
                return Err(args.invalid("expected at least one prefix"));
            }
            Filter::MultipleColumnPrefix(prefixes)
        }
        "ColumnCountGetFilter" => Filter::ColumnCountGet(args.count()?),
        "ColumnPaginationFilter" => {
            let limit = args.count()?;
            let offset = args.count()?;
            Filter::ColumnPagination { limit, offset }
        }
        "TimestampsFilter" => {
            let mut timestamps = Vec::new();
            while !args.is_exhausted() {
                timestamps.push(args.timestamp()?);
            }
            timestamps.sort_unstable();
            timestamps.dedup();
            Filter::Timestamps(timestamps)
        }
        "ColumnRangeFilter" => {
            let min = args.bytes()?;
            let min_inclusive = args.bool()?;
            let max = args.bytes()?;
            let max_inclusive = args.bool()?;
            Filter::ColumnRange(ColumnRange {
                min: (!min.is_empty()).then_some(min),
                min_inclusive,
                max: (!max.is_empty()).then_some(max),
                max_inclusive,
            })
        }
        "RowFilter" => {
            let (op, comparator) = args.comparison()?;
            Filter::Row(op, comparator)
        }
        "FamilyFilter" => {
            let (op, comparator) = args.comparison()?;
            Filter::Family(op, comparator)
        }
        "QualifierFilter" => {
            let (op, comparator) = args.comparison()?;
            Filter::Qualifier(op, comparator)
        }
        "ValueFilter" => {
            let (op, comparator) = args.comparison()?;
            Filter::Value(op, comparator)
        }
        "SingleColumnValueFilter" => {
            let family = args.bytes()?;
            let qualifier = args.bytes()?;
            let (op, comparator) = args.comparison()?;
            let (filter_if_missing, latest_version_only) = if args.is_exhausted() {
                (false, true)
            } else {
                (args.bool()?, args.bool()?)
            };
            Filter::SingleColumnValue(SingleColumnValue {
                family,
                qualifier,
                op,
                comparator,
                filter_if_missing,
                latest_version_only,
            })
        }
        _ => {
            return Err(FilterParseError::UnknownFilter {
                name: name.to_string(),
                offset,
            });
        }
    };

    args.finish()?;

    Ok(filter)
}

///
/// Args
/// Positional argument reader for one filter call.
///

struct Args<'a> {
    filter: &'a str,
    args: std::vec::IntoIter<Arg>,
}

impl<'a> Args<'a> {
    fn new(filter: &'a str, args: Vec<Arg>) -> Self {
        Self {
            filter,
            args: args.into_iter(),
        }
    }

    fn invalid(&self, reason: impl Into<String>) -> FilterParseError {
        FilterParseError::InvalidArguments {
            filter: self.filter.to_string(),
            reason: reason.into(),
        }
    }

    fn is_exhausted(&self) -> bool {
        self.args.as_slice().is_empty()
    }

    fn finish(&self) -> Result<(), FilterParseError> {
        match self.args.len() {
            0 => Ok(()),
            extra => Err(self.invalid(format!("{extra} unexpected trailing argument(s)"))),
        }
    }

    fn bytes(&mut self) -> Result<Vec<u8>, FilterParseError> {
        match self.args.next() {
            Some(Arg::Bytes(bytes)) => Ok(bytes),
            other => Err(self.invalid(format!(
                "expected quoted string, found {}",
                label(other)
            ))),
        }
    }

    fn int(&mut self) -> Result<i64, FilterParseError> {
        match self.args.next() {
            Some(Arg::Int(n)) => Ok(n),
            other => Err(self.invalid(format!("expected integer, found {}", label(other)))),
        }
    }

    fn count(&mut self) -> Result<usize, FilterParseError> {
        let n = self.int()?;
        usize::try_from(n)
            .map_err(|_| self.invalid(format!("expected non-negative count, found {n}")))
    }

    fn timestamp(&mut self) -> Result<u64, FilterParseError> {
        let n = self.int()?;
        u64::try_from(n)
            .map_err(|_| self.invalid(format!("expected non-negative timestamp, found {n}")))
    }

    fn bool(&mut self) -> Result<bool, FilterParseError> {
        match self.args.next() {
            Some(Arg::Bool(b)) => Ok(b),
            other => Err(self.invalid(format!("expected boolean, found {}", label(other)))),
        }
    }

    fn comparison(&mut self) -> Result<(CompareOp, ByteComparator), FilterParseError> {
        let op = match self.args.next() {
            Some(Arg::Op(op)) => op,
            other => {
                return Err(self.invalid(format!(
                    "expected compare operator, found {}",
                    label(other)
                )));
            }
        };
        let comparator = parse_comparator(&self.bytes()?)?;

        if matches!(
            comparator,
            ByteComparator::Substring(_) | ByteComparator::Regex(_)
        ) && !op.is_equality()
        {
            return Err(self.invalid(format!(
                "{} comparator only supports '=' and '!=', found '{op}'",
                comparator.kind()
            )));
        }

        Ok((op, comparator))
    }
}

fn label(arg: Option<Arg>) -> String {
    match arg {
        None => "end of arguments".to_string(),
        Some(Arg::Bytes(_)) => "quoted string".to_string(),
        Some(Arg::Int(n)) => format!("integer {n}"),
        Some(Arg::Bool(b)) => format!("boolean {b}"),
        Some(Arg::Op(op)) => format!("operator '{op}'"),
    }
}

fn parse_comparator(spec: &[u8]) -> Result<ByteComparator, FilterParseError> {
    let Some(split) = spec.iter().position(|b| *b == b':') else {
        return Err(FilterParseError::UnknownComparator {
            name: String::from_utf8_lossy(spec).into_owned(),
        });
    };
    let (kind, operand) = (&spec[..split], &spec[split + 1..]);

    match kind.to_ascii_lowercase().as_slice() {
        b"binary" => Ok(ByteComparator::Binary(operand.to_vec())),
        b"binaryprefix" => Ok(ByteComparator::BinaryPrefix(operand.to_vec())),
        b"substring" => Ok(ByteComparator::Substring(
            String::from_utf8_lossy(operand).to_lowercase(),
        )),
        b"regexstring" => {
            let pattern = std::str::from_utf8(operand).map_err(|err| {
                FilterParseError::InvalidRegex {
                    reason: err.to_string(),
                }
            })?;
            let regex = Regex::new(pattern).map_err(|err| FilterParseError::InvalidRegex {
                reason: err.to_string(),
            })?;
            Ok(ByteComparator::Regex(regex))
        }
        _ => Err(FilterParseError::UnknownComparator {
            name: String::from_utf8_lossy(kind).into_owned(),
        }),
    }
}
