// XML-RPC wire codec.
//
// Requests are written as compact `methodCall` documents from positional
// `serde_json::Value` parameters; responses are read back into a single
// `Value` or a fault. Only the subset of XML that XML-RPC servers emit is
// understood: elements, text, entity references, CDATA, comments and the
// XML declaration. Attributes are skipped.

use crate::error::{MagentoError, Result};
use log::trace;
use serde_json::{Map, Number, Value};

/// Deepest element nesting accepted in a response document.
const MAX_DEPTH: usize = 256;

/// Decoded `methodResponse`.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodResponse {
    Success(Value),
    Fault { code: i64, message: String },
}

impl MethodResponse {
    /// Turns a fault into `MagentoError::Fault`, leaving the payload untouched.
    pub fn into_result(self) -> Result<Value> {
        match self {
            MethodResponse::Success(value) => Ok(value),
            MethodResponse::Fault { code, message } => Err(MagentoError::Fault { code, message }),
        }
    }
}

/// Builds the `methodCall` document for `method` with the given params.
pub fn encode_call(method: &str, params: &[Value]) -> String {
    let mut out = String::with_capacity(128);
    out.push_str("<?xml version=\"1.0\"?><methodCall><methodName>");
    escape_into(&mut out, method);
    out.push_str("</methodName><params>");
    for param in params {
        out.push_str("<param>");
        encode_value(&mut out, param);
        out.push_str("</param>");
    }
    out.push_str("</params></methodCall>");
    out
}

fn encode_value(out: &mut String, value: &Value) {
    out.push_str("<value>");
    match value {
        Value::Null => out.push_str("<nil/>"),
        Value::Bool(b) => {
            out.push_str(if *b {
                "<boolean>1</boolean>"
            } else {
                "<boolean>0</boolean>"
            });
        }
        Value::Number(n) => encode_number(out, n),
        Value::String(s) => {
            out.push_str("<string>");
            escape_into(out, s);
            out.push_str("</string>");
        }
        Value::Array(items) => {
            out.push_str("<array><data>");
            for item in items {
                encode_value(out, item);
            }
            out.push_str("</data></array>");
        }
        Value::Object(map) => {
            // sorted so the document does not depend on map ordering
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push_str("<struct>");
            for key in keys {
                out.push_str("<member><name>");
                escape_into(out, key);
                out.push_str("</name>");
                encode_value(out, &map[key.as_str()]);
                out.push_str("</member>");
            }
            out.push_str("</struct>");
        }
    }
    out.push_str("</value>");
}

fn encode_number(out: &mut String, n: &Number) {
    if let Some(i) = n.as_i64() {
        let tag = if i32::try_from(i).is_ok() { "int" } else { "i8" };
        out.push_str(&format!("<{tag}>{i}</{tag}>"));
    } else if let Some(u) = n.as_u64() {
        out.push_str(&format!("<i8>{u}</i8>"));
    } else if let Some(f) = n.as_f64() {
        out.push_str(&format!("<double>{f}</double>"));
    }
}

fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

/// Parses a `methodResponse` body.
pub fn decode_response(body: &str) -> Result<MethodResponse> {
    trace!("decoding XML-RPC response of {} bytes", body.len());
    let root = Parser::new(body).parse_document()?;
    if root.local_name() != "methodResponse" {
        return Err(MagentoError::protocol(format!(
            "expected <methodResponse>, found <{}>",
            root.name
        )));
    }

    if let Some(fault) = root.child("fault") {
        let value = fault
            .child("value")
            .ok_or_else(|| MagentoError::protocol("<fault> without <value>"))?;
        let fault = decode_value(value, 0)?;
        let code = match fault.get("faultCode") {
            Some(Value::Number(n)) => n.as_i64().unwrap_or_default(),
            Some(Value::String(s)) => s.trim().parse().unwrap_or_default(),
            _ => 0,
        };
        let message = fault
            .get("faultString")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Ok(MethodResponse::Fault { code, message });
    }

    let value = root
        .child("params")
        .and_then(|params| params.child("param"))
        .and_then(|param| param.child("value"))
        .ok_or_else(|| MagentoError::protocol("response carries neither params nor fault"))?;
    Ok(MethodResponse::Success(decode_value(value, 0)?))
}

fn decode_value(value: &Element, depth: usize) -> Result<Value> {
    if depth > MAX_DEPTH {
        return Err(too_deep());
    }
    let mut typed = value.elements();
    match (typed.next(), typed.next()) {
        // untyped content defaults to string
        (None, _) => Ok(Value::String(value.text())),
        (Some(inner), None) => decode_typed(inner, depth + 1),
        (Some(_), Some(_)) => Err(MagentoError::protocol(
            "<value> holds more than one element",
        )),
    }
}

fn decode_typed(el: &Element, depth: usize) -> Result<Value> {
    match el.local_name() {
        "int" | "i4" | "i8" | "i2" | "i1" => {
            let text = el.text();
            let n: i64 = text
                .trim()
                .parse()
                .map_err(|_| MagentoError::protocol(format!("bad integer {text:?}")))?;
            Ok(Value::from(n))
        }
        "boolean" => match el.text().trim() {
            "1" | "true" => Ok(Value::Bool(true)),
            "0" | "false" => Ok(Value::Bool(false)),
            other => Err(MagentoError::protocol(format!("bad boolean {other:?}"))),
        },
        "string" => Ok(Value::String(el.text())),
        "double" => {
            let text = el.text();
            text.trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| MagentoError::protocol(format!("bad double {text:?}")))
        }
        "dateTime.iso8601" => Ok(Value::String(el.text().trim().to_string())),
        "base64" => Ok(Value::String(el.text().split_whitespace().collect())),
        "nil" => Ok(Value::Null),
        "struct" => {
            let mut map = Map::new();
            for member in el.elements().filter(|e| e.local_name() == "member") {
                let name = member
                    .child("name")
                    .ok_or_else(|| MagentoError::protocol("<member> without <name>"))?
                    .text();
                let value = member
                    .child("value")
                    .ok_or_else(|| MagentoError::protocol("<member> without <value>"))?;
                map.insert(name, decode_value(value, depth + 1)?);
            }
            Ok(Value::Object(map))
        }
        "array" => {
            let data = el
                .child("data")
                .ok_or_else(|| MagentoError::protocol("<array> without <data>"))?;
            let items = data
                .elements()
                .filter(|e| e.local_name() == "value")
                .map(|value| decode_value(value, depth + 1))
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::Array(items))
        }
        other => Err(MagentoError::protocol(format!(
            "unsupported value type <{other}>"
        ))),
    }
}

#[derive(Debug)]
enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug)]
struct Element {
    name: String,
    children: Vec<Node>,
}

impl Element {
    /// Tag name without any namespace prefix (`ex:nil` -> `nil`).
    fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        })
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|el| el.local_name() == name)
    }

    fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    fn push_text(&mut self, text: String) {
        if let Some(Node::Text(last)) = self.children.last_mut() {
            last.push_str(&text);
        } else {
            self.children.push(Node::Text(text));
        }
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Parser { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn skip_past(&mut self, terminator: &str) -> Result<()> {
        match self.rest().find(terminator) {
            Some(idx) => {
                self.pos += idx + terminator.len();
                Ok(())
            }
            None => Err(MagentoError::protocol(format!(
                "unterminated markup, expected {terminator:?}"
            ))),
        }
    }

    fn parse_document(&mut self) -> Result<Element> {
        loop {
            let trimmed = self.rest().trim_start();
            self.pos = self.src.len() - trimmed.len();
            if trimmed.starts_with("<?") {
                self.skip_past("?>")?;
            } else if trimmed.starts_with("<!--") {
                self.skip_past("-->")?;
            } else if trimmed.starts_with("<!") {
                self.skip_past(">")?;
            } else if trimmed.starts_with('<') {
                return self.parse_element(0);
            } else if trimmed.is_empty() {
                return Err(MagentoError::protocol("empty response document"));
            } else {
                return Err(MagentoError::protocol("response is not an XML document"));
            }
        }
    }

    /// Parses one element; `pos` must sit on its `<`.
    fn parse_element(&mut self, depth: usize) -> Result<Element> {
        if depth > MAX_DEPTH {
            return Err(too_deep());
        }
        self.pos += 1;
        let rest = self.rest();
        let name_len = rest
            .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
            .unwrap_or(rest.len());
        if name_len == 0 {
            return Err(MagentoError::protocol("element without a name"));
        }
        let name = rest[..name_len].to_string();
        self.pos += name_len;

        let self_closing = self.skip_tag_rest()?;
        let mut element = Element {
            name,
            children: Vec::new(),
        };
        if self_closing {
            return Ok(element);
        }

        loop {
            let rest = self.rest();
            if rest.is_empty() {
                return Err(MagentoError::protocol(format!(
                    "document ends inside <{}>",
                    element.name
                )));
            }
            if let Some(after) = rest.strip_prefix("</") {
                let end = after
                    .find('>')
                    .ok_or_else(|| MagentoError::protocol("unterminated closing tag"))?;
                let closing = after[..end].trim();
                if closing != element.name {
                    return Err(MagentoError::protocol(format!(
                        "<{}> closed by </{}>",
                        element.name, closing
                    )));
                }
                self.pos += 2 + end + 1;
                return Ok(element);
            } else if rest.starts_with("<!--") {
                self.skip_past("-->")?;
            } else if let Some(after) = rest.strip_prefix("<![CDATA[") {
                let end = after
                    .find("]]>")
                    .ok_or_else(|| MagentoError::protocol("unterminated CDATA section"))?;
                element.push_text(after[..end].to_string());
                self.pos += "<![CDATA[".len() + end + "]]>".len();
            } else if rest.starts_with("<?") {
                self.skip_past("?>")?;
            } else if rest.starts_with('<') {
                let child = self.parse_element(depth + 1)?;
                element.children.push(Node::Element(child));
            } else {
                let end = rest.find('<').unwrap_or(rest.len());
                let raw = &rest[..end];
                self.pos += end;
                // whitespace between tags is layout, not content
                let has_elements = element.elements().next().is_some();
                if !(has_elements && raw.trim().is_empty()) {
                    element.push_text(unescape(raw)?);
                }
            }
        }
    }

    /// Skips attributes up to and including `>`; reports `/>`.
    fn skip_tag_rest(&mut self) -> Result<bool> {
        let mut quote: Option<char> = None;
        let mut last_significant = ' ';
        for (idx, c) in self.rest().char_indices() {
            match quote {
                Some(q) if c == q => quote = None,
                Some(_) => {}
                None if c == '"' || c == '\'' => quote = Some(c),
                None if c == '>' => {
                    self.pos += idx + 1;
                    return Ok(last_significant == '/');
                }
                None => {
                    if !c.is_whitespace() {
                        last_significant = c;
                    }
                }
            }
        }
        Err(MagentoError::protocol("unterminated start tag"))
    }
}

fn too_deep() -> MagentoError {
    MagentoError::protocol("response nested too deeply")
}

fn unescape(raw: &str) -> Result<String> {
    if !raw.contains('&') {
        return Ok(raw.to_string());
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let semi = after
            .find(';')
            .ok_or_else(|| MagentoError::protocol("unterminated entity reference"))?;
        let entity = &after[..semi];
        let c = match entity {
            "lt" => '<',
            "gt" => '>',
            "amp" => '&',
            "quot" => '"',
            "apos" => '\'',
            _ => {
                let code = if let Some(hex) = entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                {
                    u32::from_str_radix(hex, 16).ok()
                } else if let Some(dec) = entity.strip_prefix('#') {
                    dec.parse().ok()
                } else {
                    None
                };
                code.and_then(char::from_u32).ok_or_else(|| {
                    MagentoError::protocol(format!("unknown entity &{entity};"))
                })?
            }
        };
        out.push(c);
        rest = &after[semi + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
