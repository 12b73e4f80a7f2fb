use quick_xml::{escape::escape, events::Event, Reader};

use super::{CustomerSchemaArray, Operation, SoapError, SoapResult};

pub const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// 解析済みのRPC呼び出し
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RpcRequest {
    pub operation: String,
    pub params: Vec<(String, String)>,
}

impl RpcRequest {
    pub fn new<I, K, V>(operation: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            operation: operation.into(),
            params: params
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn required(&self, name: &str) -> Result<&str, SoapError> {
        self.param(name)
            .ok_or_else(|| SoapError::Validation(format!("missing parameter '{}'", name)))
    }
}

/// `Body` の最初の子要素をオペレーション、その子要素を引数として読む。
/// 名前空間プレフィックスは無視する。
pub fn parse_request(xml: &str) -> Result<RpcRequest, SoapError> {
    let mut reader = Reader::from_str(xml);
    let mut in_body = false;
    // Body に入るまでの開いている要素数
    let mut outer = 0usize;
    let mut request: Option<RpcRequest> = None;
    // オペレーション要素からの深さ
    let mut depth = 0usize;
    let mut current: Option<(String, String)> = None;

    loop {
        match reader.read_event().map_err(SoapError::malformed)? {
            Event::Start(e) => {
                let name = local_name(e.local_name().as_ref())?;
                if request.is_some() {
                    depth += 1;
                    if depth == 1 {
                        current = Some((name, String::new()));
                    }
                } else if in_body {
                    request = Some(RpcRequest {
                        operation: name,
                        params: Vec::new(),
                    });
                } else {
                    in_body = outer == 1 && name == "Body";
                    outer += 1;
                }
            }
            Event::Empty(e) => {
                let name = local_name(e.local_name().as_ref())?;
                match request.as_mut() {
                    Some(request) => {
                        if depth == 0 {
                            request.params.push((name, String::new()));
                        }
                    }
                    None if in_body => {
                        return Ok(RpcRequest {
                            operation: name,
                            params: Vec::new(),
                        })
                    }
                    None => {}
                }
            }
            Event::Text(t) => {
                if let (1, Some((_, value))) = (depth, current.as_mut()) {
                    value.push_str(&t.unescape().map_err(SoapError::malformed)?);
                }
            }
            Event::CData(c) => {
                if let (1, Some((_, value))) = (depth, current.as_mut()) {
                    value.push_str(std::str::from_utf8(&c).map_err(SoapError::malformed)?);
                }
            }
            Event::End(_) => match request.as_mut() {
                Some(request) if depth == 0 => return Ok(request.clone()),
                Some(request) => {
                    if depth == 1 {
                        if let Some(param) = current.take() {
                            request.params.push(param);
                        }
                    }
                    depth -= 1;
                }
                None if in_body => {
                    return Err(SoapError::Malformed("SOAP Body is empty".to_owned()))
                }
                None => outer = outer.saturating_sub(1),
            },
            Event::Eof => {
                return Err(SoapError::Malformed(
                    "no SOAP Body operation found".to_owned(),
                ))
            }
            _ => {}
        }
    }
}

fn local_name(name: &[u8]) -> Result<String, SoapError> {
    std::str::from_utf8(name)
        .map(str::to_owned)
        .map_err(SoapError::malformed)
}

/// `<tns:{op}Response><tns:{op}Result>...` をエンベロープで包む
pub(super) fn response(
    namespace: &str,
    operation: Operation,
    result: SoapResult,
) -> Result<String, SoapError> {
    let result_tag = format!("tns:{}Result", operation);
    let inner = match result {
        SoapResult::Customer(customer) => {
            quick_xml::se::to_string_with_root(&result_tag, &customer)
        }
        SoapResult::Customers(items) => {
            quick_xml::se::to_string_with_root(&result_tag, &CustomerSchemaArray { items })
        }
        SoapResult::Acknowledged => Ok(format!("<{}/>", result_tag)),
    }
    .map_err(|e| SoapError::Internal(e.to_string()))?;
    Ok(wrap(
        namespace,
        &format!(
            "<tns:{op}Response>{inner}</tns:{op}Response>",
            op = operation,
            inner = inner
        ),
    ))
}

pub(super) fn fault(error: &SoapError) -> String {
    wrap_body(
        "",
        &format!(
            "<soap11env:Fault><faultcode>{}</faultcode><faultstring>{}</faultstring></soap11env:Fault>",
            error.fault_code(),
            escape(error.fault_string().as_str())
        ),
    )
}

fn wrap(namespace: &str, body: &str) -> String {
    wrap_body(
        &format!(r#" xmlns:tns="{}""#, escape(namespace)),
        body,
    )
}

fn wrap_body(extra_ns: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><soap11env:Envelope xmlns:soap11env="{}"{}><soap11env:Body>{}</soap11env:Body></soap11env:Envelope>"#,
        SOAP_ENV_NS, extra_ns, body
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::soap::CustomerSchema;

    #[test]
    fn test_parse_request() {
        let xml = r#"<?xml version="1.0"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns:cus="ecam.soap.customer">
  <soapenv:Header>
    <cus:Body>ignored</cus:Body>
  </soapenv:Header>
  <soapenv:Body>
    <cus:customer_edit>
      <cus:customer_id>12</cus:customer_id>
      <cus:name>a &amp; b</cus:name>
    </cus:customer_edit>
  </soapenv:Body>
</soapenv:Envelope>"#;
        let request = parse_request(xml).unwrap();
        assert_eq!(request.operation, "customer_edit");
        assert_eq!(request.param("customer_id"), Some("12"));
        assert_eq!(request.param("name"), Some("a & b"));
        assert_eq!(request.param("family"), None);
    }

    #[test]
    fn test_parse_request_without_prefix_and_cdata() {
        let xml = r#"<Envelope><Body><customer_create><name><![CDATA[x<y]]></name><extra/></customer_create></Body></Envelope>"#;
        let request = parse_request(xml).unwrap();
        assert_eq!(
            request,
            RpcRequest::new("customer_create", [("name", "x<y"), ("extra", "")])
        );
    }

    #[test]
    fn test_parse_request_ignores_nested_elements() {
        let xml = r#"<Envelope><Body><customer_get><customer_id>3<note>x</note></customer_id></customer_get></Body></Envelope>"#;
        let request = parse_request(xml).unwrap();
        assert_eq!(request.param("customer_id"), Some("3"));
        assert_eq!(request.params.len(), 1);
    }

    #[test]
    fn test_parse_request_errors() {
        assert!(matches!(
            parse_request("<Envelope><Body></Body></Envelope>"),
            Err(SoapError::Malformed(_))
        ));
        assert!(matches!(
            parse_request("<Envelope><Header/></Envelope>"),
            Err(SoapError::Malformed(_))
        ));
        assert!(matches!(
            parse_request("<Envelope><Body><op>"),
            Err(SoapError::Malformed(_))
        ));
    }

    #[test]
    fn test_response() {
        let xml = response(
            "ecam.soap.customer",
            Operation::Get,
            SoapResult::Customer(CustomerSchema {
                id: 1,
                name: "john".to_owned(),
            }),
        )
        .unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains(r#"xmlns:tns="ecam.soap.customer""#));
        assert!(xml.contains(
            "<soap11env:Body><tns:customer_getResponse><tns:customer_getResult><tns:id>1</tns:id><tns:name>john</tns:name></tns:customer_getResult></tns:customer_getResponse></soap11env:Body>"
        ));

        // 応答自体が解析可能なエンベロープであること
        let parsed = parse_request(&xml).unwrap();
        assert_eq!(parsed.operation, "customer_getResponse");
    }

    #[test]
    fn test_fault() {
        let xml = fault(&SoapError::Validation("name <bad>".to_owned()));
        assert!(xml.contains("<faultcode>soap11env:Client.ValidationError</faultcode>"));
        assert!(xml.contains("<faultstring>name &lt;bad&gt;</faultstring>"));

        let xml = fault(&SoapError::Internal("secret detail".to_owned()));
        assert!(xml.contains("<faultcode>soap11env:Server</faultcode>"));
        assert!(!xml.contains("secret detail"));
    }
}
