//! XML-RPC wire codec.
//!
//! Values travel as [`serde_json::Value`] on the Rust side so that responses can be
//! handed to serde for typed decoding. Both directions of the protocol are covered:
//! a client needs `encode_call` / `decode_response`, an in-process server double
//! needs `decode_call` / `encode_response` / `encode_fault`.

use std::iter::Peekable;
use std::vec::IntoIter;

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{Map, Number, Value};

use crate::error::{Error, Result};

const XML_DECL: &str = r#"<?xml version="1.0"?>"#;

/// A decoded `<methodCall>`.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub method: String,
    pub params: Vec<Value>,
}

pub fn encode_call(method: &str, params: &[Value]) -> Result<String> {
    let mut out = String::from(XML_DECL);
    out.push_str("<methodCall><methodName>");
    out.push_str(&escape(method));
    out.push_str("</methodName><params>");
    for param in params {
        out.push_str("<param>");
        encode_value(&mut out, param)?;
        out.push_str("</param>");
    }
    out.push_str("</params></methodCall>");
    Ok(out)
}

pub fn encode_response(value: &Value) -> Result<String> {
    let mut out = String::from(XML_DECL);
    out.push_str("<methodResponse><params><param>");
    encode_value(&mut out, value)?;
    out.push_str("</param></params></methodResponse>");
    Ok(out)
}

pub fn encode_fault(code: i64, message: &str) -> String {
    let mut fault = Map::new();
    fault.insert("faultCode".into(), Value::from(code));
    fault.insert("faultString".into(), Value::from(message));

    let mut out = String::from(XML_DECL);
    out.push_str("<methodResponse><fault>");
    // a string and an i64 always encode
    let _ = encode_value(&mut out, &Value::Object(fault));
    out.push_str("</fault></methodResponse>");
    out
}

/// Integers travel as `<int>` or `<i8>`; an unsigned value beyond `i64::MAX` has no
/// XML-RPC representation and is rejected rather than rounded into a `<double>`.
fn encode_value(out: &mut String, value: &Value) -> Result<()> {
    out.push_str("<value>");
    match value {
        Value::Null => out.push_str("<nil/>"),
        Value::Bool(true) => out.push_str("<boolean>1</boolean>"),
        Value::Bool(false) => out.push_str("<boolean>0</boolean>"),
        Value::Number(n) => match n.as_i64() {
            Some(i) if i32::try_from(i).is_ok() => {
                out.push_str(&format!("<int>{i}</int>"));
            }
            Some(i) => out.push_str(&format!("<i8>{i}</i8>")),
            None if n.is_u64() => {
                return Err(Error::Xml(format!("integer {n} does not fit in <i8>")));
            }
            None => {
                let f = n.as_f64().unwrap_or_default();
                out.push_str(&format!("<double>{f}</double>"));
            }
        },
        Value::String(s) => {
            out.push_str("<string>");
            out.push_str(&escape(s.as_str()));
            out.push_str("</string>");
        }
        Value::Array(items) => {
            out.push_str("<array><data>");
            for item in items {
                encode_value(out, item)?;
            }
            out.push_str("</data></array>");
        }
        Value::Object(members) => {
            out.push_str("<struct>");
            for (name, member) in members {
                out.push_str("<member><name>");
                out.push_str(&escape(name.as_str()));
                out.push_str("</name>");
                encode_value(out, member)?;
                out.push_str("</member>");
            }
            out.push_str("</struct>");
        }
    }
    out.push_str("</value>");
    Ok(())
}

/// Decodes a `<methodResponse>`. A `<fault>` becomes [`Error::Fault`].
pub fn decode_response(xml: &str) -> Result<Value> {
    let mut parser = Parser::new(xml)?;
    parser.expect_open("methodResponse")?;
    let result = match parser.next_tag()? {
        Token::Open(tag) if tag == "params" => {
            parser.expect_open("param")?;
            let value = parser.value()?;
            parser.expect_close("param")?;
            parser.expect_close("params")?;
            Ok(value)
        }
        Token::Open(tag) if tag == "fault" => {
            let value = parser.value()?;
            parser.expect_close("fault")?;
            Err(fault(&value))
        }
        other => return Err(unexpected("<params> or <fault>", &other)),
    };
    parser.expect_close("methodResponse")?;
    result
}

pub fn decode_call(xml: &str) -> Result<MethodCall> {
    let mut parser = Parser::new(xml)?;
    parser.expect_open("methodCall")?;
    parser.expect_open("methodName")?;
    let method = parser.text_until("methodName")?;

    let mut params = Vec::new();
    match parser.next_tag()? {
        Token::Open(tag) if tag == "params" => loop {
            match parser.next_tag()? {
                Token::Open(tag) if tag == "param" => {
                    params.push(parser.value()?);
                    parser.expect_close("param")?;
                }
                Token::Close(tag) if tag == "params" => break,
                other => return Err(unexpected("<param>", &other)),
            }
        },
        Token::Empty(tag) if tag == "params" => {}
        Token::Close(tag) if tag == "methodCall" => {
            return Ok(MethodCall { method, params });
        }
        other => return Err(unexpected("<params>", &other)),
    }
    parser.expect_close("methodCall")?;

    Ok(MethodCall { method, params })
}

/// Older endpoints send `faultCode` as a string. A numeric string is parsed; any
/// other code is kept in the message and the numeric code is 0.
fn fault(value: &Value) -> Error {
    let message = value
        .get("faultString")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();

    let raw = value.get("faultCode");
    let code = raw.and_then(|code| {
        code.as_i64()
            .or_else(|| code.as_str().and_then(|s| s.trim().parse().ok()))
    });

    match (code, raw) {
        (Some(code), _) => Error::Fault { code, message },
        (None, Some(raw)) => {
            let raw = raw.as_str().map(str::to_owned).unwrap_or_else(|| raw.to_string());
            Error::Fault {
                code: 0,
                message: format!("{message} (faultCode: {raw})"),
            }
        }
        (None, None) => Error::Fault { code: 0, message },
    }
}

#[derive(Debug, PartialEq)]
enum Token {
    Open(String),
    Close(String),
    Empty(String),
    Text(String),
}

fn unexpected(expected: &str, found: &Token) -> Error {
    Error::Xml(format!("expected {expected}, found {found:?}"))
}

fn tag_name(name: &[u8]) -> String {
    String::from_utf8_lossy(name).into_owned()
}

fn tokenize(xml: &str) -> Result<Vec<Token>> {
    let mut reader = Reader::from_str(xml);
    let mut tokens = Vec::new();

    loop {
        let text = match reader.read_event().map_err(Error::xml)? {
            Event::Start(e) => {
                tokens.push(Token::Open(tag_name(e.local_name().as_ref())));
                continue;
            }
            Event::End(e) => {
                tokens.push(Token::Close(tag_name(e.local_name().as_ref())));
                continue;
            }
            Event::Empty(e) => {
                tokens.push(Token::Empty(tag_name(e.local_name().as_ref())));
                continue;
            }
            Event::Text(e) => e.unescape().map_err(Error::xml)?.into_owned(),
            Event::CData(e) => String::from_utf8(e.into_inner().into_owned()).map_err(Error::xml)?,
            Event::Eof => break,
            _ => continue,
        };
        // CDATA sections split text into several events
        match tokens.last_mut() {
            Some(Token::Text(previous)) => previous.push_str(&text),
            _ => tokens.push(Token::Text(text)),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Peekable<IntoIter<Token>>,
}

impl Parser {
    fn new(xml: &str) -> Result<Self> {
        Ok(Parser {
            tokens: tokenize(xml)?.into_iter().peekable(),
        })
    }

    fn next_raw(&mut self) -> Result<Token> {
        self.tokens
            .next()
            .ok_or_else(|| Error::Xml("unexpected end of document".into()))
    }

    /// Next token, skipping indentation between elements.
    fn next_tag(&mut self) -> Result<Token> {
        self.skip_whitespace();
        self.next_raw()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.tokens.peek(), Some(Token::Text(t)) if t.trim().is_empty()) {
            self.tokens.next();
        }
    }

    fn expect_open(&mut self, name: &str) -> Result<()> {
        match self.next_tag()? {
            Token::Open(tag) if tag == name => Ok(()),
            other => Err(unexpected(&format!("<{name}>"), &other)),
        }
    }

    fn expect_close(&mut self, name: &str) -> Result<()> {
        match self.next_tag()? {
            Token::Close(tag) if tag == name => Ok(()),
            other => Err(unexpected(&format!("</{name}>"), &other)),
        }
    }

    fn text_until(&mut self, name: &str) -> Result<String> {
        let mut text = String::new();
        loop {
            match self.next_raw()? {
                Token::Text(t) => text.push_str(&t),
                Token::Close(tag) if tag == name => return Ok(text),
                other => return Err(unexpected(&format!("</{name}>"), &other)),
            }
        }
    }

    fn value(&mut self) -> Result<Value> {
        match self.next_tag()? {
            Token::Open(tag) if tag == "value" => {}
            Token::Empty(tag) if tag == "value" => return Ok(Value::String(String::new())),
            other => return Err(unexpected("<value>", &other)),
        }

        // untyped content is a string
        let mut text = String::new();
        let value = loop {
            match self.next_raw()? {
                Token::Text(t) => text.push_str(&t),
                Token::Close(tag) if tag == "value" => return Ok(Value::String(text)),
                Token::Open(ty) => break self.typed(&ty)?,
                Token::Empty(ty) => break empty(&ty)?,
                other => return Err(unexpected("a typed value", &other)),
            }
        };
        self.expect_close("value")?;

        Ok(value)
    }

    fn typed(&mut self, ty: &str) -> Result<Value> {
        match ty {
            "array" => self.array(),
            "struct" => self.members(),
            _ => {
                let text = self.text_until(ty)?;
                scalar(ty, text)
            }
        }
    }

    fn array(&mut self) -> Result<Value> {
        let mut items = Vec::new();
        match self.next_tag()? {
            Token::Open(tag) if tag == "data" => loop {
                self.skip_whitespace();
                if matches!(self.tokens.peek(), Some(Token::Close(tag)) if tag == "data") {
                    self.tokens.next();
                    break;
                }
                items.push(self.value()?);
            },
            Token::Empty(tag) if tag == "data" => {}
            other => return Err(unexpected("<data>", &other)),
        }
        self.expect_close("array")?;

        Ok(Value::Array(items))
    }

    fn members(&mut self) -> Result<Value> {
        let mut members = Map::new();
        loop {
            match self.next_tag()? {
                Token::Open(tag) if tag == "member" => {
                    self.expect_open("name")?;
                    let name = self.text_until("name")?;
                    let value = self.value()?;
                    self.expect_close("member")?;
                    members.insert(name, value);
                }
                Token::Close(tag) if tag == "struct" => break,
                other => return Err(unexpected("<member>", &other)),
            }
        }

        Ok(Value::Object(members))
    }
}

fn empty(ty: &str) -> Result<Value> {
    match ty {
        "nil" => Ok(Value::Null),
        "string" | "base64" | "dateTime.iso8601" => Ok(Value::String(String::new())),
        "array" => Ok(Value::Array(Vec::new())),
        "struct" => Ok(Value::Object(Map::new())),
        other => Err(Error::Xml(format!("empty <{other}/> carries no value"))),
    }
}

fn invalid(ty: &str, text: &str) -> Error {
    Error::Xml(format!("invalid <{ty}>: {text:?}"))
}

fn scalar(ty: &str, text: String) -> Result<Value> {
    match ty {
        "int" | "i4" | "i8" => text
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| invalid(ty, &text)),
        "boolean" => match text.trim() {
            "1" => Ok(Value::Bool(true)),
            "0" => Ok(Value::Bool(false)),
            _ => Err(invalid(ty, &text)),
        },
        "double" => text
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| invalid(ty, &text)),
        "string" | "dateTime.iso8601" | "base64" => Ok(Value::String(text)),
        "nil" => Ok(Value::Null),
        other => Err(Error::Xml(format!("unsupported value type <{other}>"))),
    }
}
