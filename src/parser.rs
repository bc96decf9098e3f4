//! Tokenizer and recursive-descent parsers for quantity, unit, assembly,
//! measurement and range expressions.
//!
//! The tokenizer is a single left-to-right scan producing located tokens;
//! the [`TokenWalker`] implements the grammar with `accept_*` methods:
//! each either consumes a prefix of the token stream and returns a value,
//! or leaves the cursor where it was and returns `None`.

use once_cell::sync::Lazy;
use regex::Regex;
use smallvec::SmallVec;
use std::sync::Arc;

use crate::assembly::{AssemblyPart, RawAssembly, RawVariablePart};
use crate::dimension::Dimensionality;
use crate::error::{QuantexError, Span};
use crate::unit::UnitDef;

// Scalars allow stray spaces around the decimal point; the sign is part
// of the token only when the previous token is not itself a scalar.
static SCALAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[+-] *)?(?:[0-9]* *\. *[0-9]+|[0-9]+(?: *\.)?)(?:e[+-]?[0-9]+)?").unwrap()
});
static PUNCT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\*\*|\*|/|\(|\)|\^|±|\+-|-|~)").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ +").unwrap());
// Identifiers are letters plus the micro signs (U+00B5, U+03BC) and '_'.
static IDENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-zµμ_]+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum OpKind {
    Mul,
    Div,
    Exp,
    Unc,
    Rng,
    Var,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum TokenKind {
    Scalar(f64),
    Ident,
    GroupOpen,
    GroupClose,
    Op(OpKind),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) span: Span,
}

/// Name lookups the parser needs. Implemented by the registry and by the
/// loader's in-progress index, so context options can be parsed while the
/// registry is still being built.
pub(crate) trait UnitResolver {
    fn resolve_unit(&self, name: &str) -> Option<&Arc<UnitDef>>;
    fn resolve_group(&self, key: &str) -> Option<&[Arc<UnitDef>]>;
    fn similar_unit_names(&self, _name: &str) -> Vec<String> {
        Vec::new()
    }
}

/// Registry-independent result of parsing a quantity: canonical value
/// plus dimensionality.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawQuantity {
    pub(crate) dimensionality: Dimensionality,
    pub(crate) value: f64,
}

/// Result of parsing a (possibly composite) unit. Arithmetic narrows to
/// the composite variant; only a lone atomic unit keeps its offset.
#[derive(Debug, Clone)]
pub(crate) enum RawUnit {
    Atomic(Arc<UnitDef>),
    Composite {
        dimensionality: Dimensionality,
        scale: f64,
    },
}

impl RawUnit {
    pub(crate) fn dimensionality(&self) -> &Dimensionality {
        match self {
            Self::Atomic(def) => &def.dimensionality,
            Self::Composite { dimensionality, .. } => dimensionality,
        }
    }

    pub(crate) fn scale(&self) -> f64 {
        match self {
            Self::Atomic(def) => def.scale,
            Self::Composite { scale, .. } => *scale,
        }
    }

    /// Canonical value of `scalar` read in this unit. The offset applies
    /// only while the unit is still atomic.
    pub(crate) fn apply(&self, scalar: f64) -> f64 {
        match self {
            Self::Atomic(def) => scalar * def.scale + def.offset,
            Self::Composite { scale, .. } => scalar * scale,
        }
    }

    fn compose(&self, other: &RawUnit, exp: f64) -> RawUnit {
        RawUnit::Composite {
            dimensionality: self.dimensionality() * &other.dimensionality().pow(exp),
            scale: self.scale() * other.scale().powf(exp),
        }
    }

    fn mul(&self, other: &RawUnit) -> RawUnit {
        self.compose(other, 1.0)
    }

    fn div(&self, other: &RawUnit) -> RawUnit {
        self.compose(other, -1.0)
    }

    fn powf(&self, exp: f64) -> RawUnit {
        RawUnit::Composite {
            dimensionality: self.dimensionality().pow(exp),
            scale: self.scale().powf(exp),
        }
    }
}

/// Scans `source` into located tokens and returns a walker over them.
///
/// Fails with a single-character "invalid value" diagnostic at the first
/// position that matches no token class.
pub(crate) fn tokenize<'a, R: UnitResolver>(
    source: &'a str,
    resolver: &'a R,
) -> Result<TokenWalker<'a, R>, QuantexError> {
    let mut tokens: SmallVec<[Token; 16]> = SmallVec::new();
    let mut cursor = 0;

    while cursor < source.len() {
        let rest = &source[cursor..];
        let after_scalar = matches!(
            tokens.last(),
            Some(Token {
                kind: TokenKind::Scalar(_),
                ..
            })
        );

        if !after_scalar {
            if let Some(found) = SCALAR.find(rest) {
                let span = Span::new(cursor, cursor + found.end());
                let text = found.as_str().replace(' ', "");
                let value = match text.parse::<f64>() {
                    Ok(value) => value,
                    Err(_) => return Err(QuantexError::parse("invalid value", span, source)),
                };
                tokens.push(Token {
                    kind: TokenKind::Scalar(value),
                    span,
                });
                cursor += found.end();
                continue;
            }
        }

        if let Some(found) = PUNCT.find(rest) {
            let span = Span::new(cursor, cursor + found.end());
            let kind = match found.as_str() {
                "*" => TokenKind::Op(OpKind::Mul),
                "/" => TokenKind::Op(OpKind::Div),
                "**" | "^" => TokenKind::Op(OpKind::Exp),
                "±" | "+-" => TokenKind::Op(OpKind::Unc),
                "-" => TokenKind::Op(OpKind::Rng),
                "~" => TokenKind::Op(OpKind::Var),
                "(" => TokenKind::GroupOpen,
                _ => TokenKind::GroupClose,
            };
            tokens.push(Token { kind, span });
            cursor += found.end();
        } else if let Some(found) = WHITESPACE.find(rest) {
            cursor += found.end();
        } else if let Some(found) = IDENT.find(rest) {
            tokens.push(Token {
                kind: TokenKind::Ident,
                span: Span::new(cursor, cursor + found.end()),
            });
            cursor += found.end();
        } else {
            let width = rest.chars().next().map(char::len_utf8).unwrap_or(1);
            return Err(QuantexError::parse(
                "invalid value",
                Span::new(cursor, cursor + width),
                source,
            ));
        }
    }

    Ok(TokenWalker {
        resolver,
        source,
        tokens,
        cursor: 0,
        groups: Vec::new(),
    })
}

/// Cursor over the token stream implementing the grammar.
#[derive(Debug)]
pub(crate) struct TokenWalker<'a, R: UnitResolver> {
    resolver: &'a R,
    source: &'a str,
    tokens: SmallVec<[Token; 16]>,
    cursor: usize,
    groups: Vec<Span>,
}

impl<'a, R: UnitResolver> TokenWalker<'a, R> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.cursor).copied()
    }

    /// Span of the next token, or of the end of input.
    fn peek_span(&self) -> Span {
        match self.peek() {
            Some(token) => token.span,
            None => Span::new(self.source.len().saturating_sub(1), self.source.len()),
        }
    }

    fn advance(&mut self) {
        self.cursor += 1;
    }

    fn ident_text(&self, span: Span) -> &'a str {
        span.text(self.source)
    }

    fn err(&self, message: impl Into<String>, span: Span) -> QuantexError {
        QuantexError::parse(message, span, self.source)
    }

    pub(crate) fn accept_scalar(&mut self) -> Option<f64> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Scalar(value),
                ..
            }) => {
                self.advance();
                Some(value)
            }
            _ => None,
        }
    }

    fn accept_base_unit(&mut self) -> Result<Option<Arc<UnitDef>>, QuantexError> {
        let Some(Token {
            kind: TokenKind::Ident,
            span,
        }) = self.peek()
        else {
            return Ok(None);
        };
        self.advance();

        let name = self.ident_text(span);
        match self.resolver.resolve_unit(name) {
            Some(unit) => Ok(Some(unit.clone())),
            None => {
                let mut message = format!("invalid unit '{name}'");
                if let Some(candidate) = self.resolver.similar_unit_names(name).first() {
                    message.push_str(&format!(", did you mean '{candidate}'?"));
                }
                Err(self.err(message, span))
            }
        }
    }

    /// `composite := ['('] base_unit { op_tail } [')']` with a shared
    /// parenthesis stack; brackets are validated without changing the
    /// left-to-right combination order.
    pub(crate) fn accept_composite_unit(&mut self) -> Result<Option<RawUnit>, QuantexError> {
        if let Some(token) = self.peek() {
            if token.kind == TokenKind::GroupOpen {
                self.groups.push(token.span);
                self.advance();
            }
        }

        let Some(base) = self.accept_base_unit()? else {
            return Ok(None);
        };
        let mut current = RawUnit::Atomic(base);

        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Op(OpKind::Exp) => {
                    self.advance();
                    let Some(exp) = self.accept_scalar() else {
                        return Err(self.err("invalid token, expected scalar", self.peek_span()));
                    };
                    current = current.powf(exp);
                }
                TokenKind::Op(op @ (OpKind::Mul | OpKind::Div)) => {
                    self.advance();
                    let operand = if matches!(
                        self.peek(),
                        Some(Token {
                            kind: TokenKind::GroupOpen,
                            ..
                        })
                    ) {
                        self.accept_composite_unit()?
                    } else {
                        self.accept_base_unit()?.map(RawUnit::Atomic)
                    };
                    let Some(operand) = operand else {
                        return Err(self.err("invalid token, expected unit", self.peek_span()));
                    };
                    current = match op {
                        OpKind::Mul => current.mul(&operand),
                        _ => current.div(&operand),
                    };
                }
                TokenKind::GroupClose => {
                    if self.groups.pop().is_none() {
                        return Err(self.err("invalid token", token.span));
                    }
                    self.advance();
                }
                _ => break,
            }
        }

        if let Some(open) = self.groups.last() {
            return Err(self.err(
                "unexpected end of input, expected matching closing parenthesis",
                *open,
            ));
        }

        Ok(Some(current))
    }

    /// `quantity := scalar [composite]`; a missing unit means
    /// dimensionless.
    pub(crate) fn accept_quantity(&mut self) -> Result<Option<RawQuantity>, QuantexError> {
        let Some(scalar) = self.accept_scalar() else {
            return Ok(None);
        };

        Ok(Some(match self.accept_composite_unit()? {
            Some(unit) => RawQuantity {
                dimensionality: unit.dimensionality().clone(),
                value: unit.apply(scalar),
            },
            None => RawQuantity {
                dimensionality: Dimensionality::new(),
                value: scalar,
            },
        }))
    }

    /// `measurement := quantity [('±' | '+-') quantity]`.
    pub(crate) fn accept_measurement(
        &mut self,
    ) -> Result<Option<(RawQuantity, Option<RawQuantity>)>, QuantexError> {
        let Some(quantity) = self.accept_quantity()? else {
            return Ok(None);
        };

        match self.peek() {
            Some(Token {
                kind: TokenKind::Op(OpKind::Unc),
                ..
            }) => self.advance(),
            None => return Ok(Some((quantity, None))),
            Some(token) => {
                return Err(self.err(
                    "invalid token, expected uncertainty operator or end of input",
                    token.span,
                ));
            }
        }

        let Some(uncertainty) = self.accept_quantity()? else {
            return Err(self.err(
                "invalid token, expected uncertainty quantity",
                self.peek_span(),
            ));
        };
        Ok(Some((quantity, Some(uncertainty))))
    }

    /// `range := quantity '-' quantity`.
    pub(crate) fn accept_range(
        &mut self,
    ) -> Result<Option<(RawQuantity, RawQuantity)>, QuantexError> {
        let Some(low) = self.accept_quantity()? else {
            return Ok(None);
        };

        match self.peek() {
            Some(Token {
                kind: TokenKind::Op(OpKind::Rng),
                ..
            }) => self.advance(),
            _ => {
                return Err(self.err("invalid token, expected range operator", self.peek_span()));
            }
        }

        let Some(high) = self.accept_quantity()? else {
            return Err(self.err("invalid token, expected range quantity", self.peek_span()));
        };
        Ok(Some((low, high)))
    }

    fn accept_assembly_power(&mut self) -> Result<f64, QuantexError> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Op(OpKind::Exp),
                ..
            }) => {
                self.advance();
                match self.accept_scalar() {
                    Some(exp) => Ok(exp),
                    None => Err(self.err("invalid token, expected scalar", self.peek_span())),
                }
            }
            _ => Ok(1.0),
        }
    }

    /// `assembly := part { ('*' | '/') part }` where
    /// `part := ['~'] NAME [('**' | '^') scalar]`. At most one part may be
    /// variable; a `/` before a part flips the sign of its power, and
    /// `~NAME` resolves against the unit-group index before single units.
    pub(crate) fn accept_assembly(
        &mut self,
    ) -> Result<Option<(RawAssembly, Dimensionality)>, QuantexError> {
        let resolver = self.resolver;
        let mut dimensionality = Dimensionality::new();
        let mut assembly = RawAssembly::default();

        loop {
            let mut power = 1.0;
            let mut started = false;
            let mut variable = false;

            if !assembly.before.is_empty() || assembly.variable.is_some() {
                match self.peek() {
                    Some(Token {
                        kind: TokenKind::Op(OpKind::Mul),
                        ..
                    }) => self.advance(),
                    Some(Token {
                        kind: TokenKind::Op(OpKind::Div),
                        ..
                    }) => {
                        self.advance();
                        power = -1.0;
                        started = true;
                    }
                    _ => {}
                }
            }

            if assembly.variable.is_none() {
                match self.peek() {
                    Some(Token {
                        kind: TokenKind::Op(OpKind::Var),
                        ..
                    }) => {
                        self.advance();
                        variable = true;
                    }
                    None => break,
                    _ => {}
                }
            }

            let name_span = match self.peek() {
                Some(Token {
                    kind: TokenKind::Ident,
                    span,
                }) => {
                    self.advance();
                    span
                }
                _ if started || variable => {
                    return Err(self.err("invalid token, expected unit", self.peek_span()));
                }
                _ => break,
            };
            let name = self.ident_text(name_span);

            power *= self.accept_assembly_power()?;

            let group = if variable {
                resolver.resolve_group(name)
            } else {
                None
            };
            if let Some(group) = group {
                if let Some(first) = group.first() {
                    dimensionality = &dimensionality * &first.dimensionality.pow(power);
                }
                assembly.variable = Some(RawVariablePart {
                    units: group.to_vec(),
                    power,
                });
            } else if let Some(unit) = resolver.resolve_unit(name) {
                dimensionality = &dimensionality * &unit.dimensionality.pow(power);
                if variable {
                    assembly.variable = Some(RawVariablePart {
                        units: vec![unit.clone()],
                        power,
                    });
                } else {
                    let part = AssemblyPart {
                        unit: unit.clone(),
                        power,
                    };
                    if assembly.variable.is_some() {
                        assembly.after.push(part);
                    } else {
                        assembly.before.push(part);
                    }
                }
            } else {
                return Err(self.err("invalid name", name_span));
            }
        }

        if assembly.is_empty() {
            return Ok(None);
        }
        Ok(Some((assembly, dimensionality)))
    }

    pub(crate) fn expect_eof(&self) -> Result<(), QuantexError> {
        match self.peek() {
            Some(token) => Err(self.err("invalid token", token.span)),
            None => Ok(()),
        }
    }

    /// Asserts the accepted value is present and the stream is exhausted.
    pub(crate) fn expect_only<T>(&self, value: Option<T>) -> Result<T, QuantexError> {
        let Some(value) = value else {
            return Err(self.err("invalid token", self.peek_span()));
        };
        self.expect_eof()?;
        Ok(value)
    }
}
