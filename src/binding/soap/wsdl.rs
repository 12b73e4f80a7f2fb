use quick_xml::escape::escape;

use super::{Operation, NAME_MAX_LEN, NAME_MIN_LEN, NAME_PATTERN};

const SERVICE_NAME: &str = "CustomerService";

struct Param {
    name: &'static str,
    xsd_type: &'static str,
    min_occurs: u8,
}

const fn param(name: &'static str, xsd_type: &'static str) -> Param {
    Param {
        name,
        xsd_type,
        min_occurs: 1,
    }
}

impl Operation {
    fn params(&self) -> &'static [Param] {
        const ORDER_BY: Param = Param {
            name: "order_by",
            xsd_type: "tns:SortOrder",
            min_occurs: 0,
        };
        const CUSTOMER_ID: Param = param("customer_id", "xs:string");
        const NAME: Param = param("name", "tns:CustomerName");
        match self {
            Operation::GetList => &[ORDER_BY],
            Operation::Get | Operation::Delete => &[CUSTOMER_ID],
            Operation::Create => &[NAME],
            Operation::Edit => &[CUSTOMER_ID, NAME],
        }
    }

    fn result_type(&self) -> &'static str {
        match self {
            Operation::GetList => "tns:CustomerSchemaArray",
            _ => "tns:CustomerSchema",
        }
    }

    fn documentation(&self) -> &'static str {
        match self {
            Operation::GetList => "List all customers sorted by name.",
            Operation::Get => "Get a customer by id.",
            Operation::Create => "Create a customer; the id is assigned by the server.",
            Operation::Edit => "Change the name of a customer.",
            Operation::Delete => {
                "Delete a customer. Always succeeds and returns an empty result."
            }
        }
    }
}

/// WSDL 1.1 (document/literal)
pub(super) fn describe(namespace: &str, location: &str) -> String {
    let ns = escape(namespace);
    let mut elements = String::new();
    let mut messages = String::new();
    let mut port_ops = String::new();
    let mut binding_ops = String::new();

    for op in Operation::ALL {
        let params = op
            .params()
            .iter()
            .map(|p| {
                format!(
                    r#"<xs:element name="{}" type="{}" minOccurs="{}"/>"#,
                    p.name, p.xsd_type, p.min_occurs
                )
            })
            .collect::<String>();
        elements.push_str(&format!(
            r#"<xs:element name="{op}"><xs:complexType><xs:sequence>{params}</xs:sequence></xs:complexType></xs:element>"#
        ));
        elements.push_str(&format!(
            r#"<xs:element name="{op}Response"><xs:complexType><xs:sequence><xs:element name="{op}Result" type="{ty}" minOccurs="0" nillable="true"/></xs:sequence></xs:complexType></xs:element>"#,
            ty = op.result_type()
        ));
        messages.push_str(&format!(
            r#"<wsdl:message name="{op}"><wsdl:part name="{op}" element="tns:{op}"/></wsdl:message><wsdl:message name="{op}Response"><wsdl:part name="{op}Response" element="tns:{op}Response"/></wsdl:message>"#
        ));
        port_ops.push_str(&format!(
            r#"<wsdl:operation name="{op}"><wsdl:documentation>{doc}</wsdl:documentation><wsdl:input name="{op}" message="tns:{op}"/><wsdl:output name="{op}Response" message="tns:{op}Response"/></wsdl:operation>"#,
            doc = op.documentation()
        ));
        binding_ops.push_str(&format!(
            r#"<wsdl:operation name="{op}"><soap:operation soapAction="{op}" style="document"/><wsdl:input name="{op}"><soap:body use="literal"/></wsdl:input><wsdl:output name="{op}Response"><soap:body use="literal"/></wsdl:output></wsdl:operation>"#
        ));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<wsdl:definitions xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/" xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/" xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:tns="{ns}" targetNamespace="{ns}" name="{SERVICE_NAME}">
<wsdl:types>
<xs:schema targetNamespace="{ns}" elementFormDefault="qualified">
<xs:simpleType name="CustomerName"><xs:restriction base="xs:string"><xs:minLength value="{NAME_MIN_LEN}"/><xs:maxLength value="{NAME_MAX_LEN}"/><xs:pattern value="{NAME_PATTERN}"/></xs:restriction></xs:simpleType>
<xs:simpleType name="SortOrder"><xs:restriction base="xs:string"><xs:enumeration value="ASC"/><xs:enumeration value="DESC"/></xs:restriction></xs:simpleType>
<xs:complexType name="CustomerSchema"><xs:sequence><xs:element name="id" type="xs:unsignedInt" minOccurs="0"/><xs:element name="name" type="tns:CustomerName" minOccurs="0"/></xs:sequence></xs:complexType>
<xs:complexType name="CustomerSchemaArray"><xs:sequence><xs:element name="CustomerSchema" type="tns:CustomerSchema" minOccurs="0" maxOccurs="unbounded"/></xs:sequence></xs:complexType>
{elements}
</xs:schema>
</wsdl:types>
{messages}
<wsdl:portType name="{SERVICE_NAME}">{port_ops}</wsdl:portType>
<wsdl:binding name="{SERVICE_NAME}" type="tns:{SERVICE_NAME}"><soap:binding style="document" transport="http://schemas.xmlsoap.org/soap/http"/>{binding_ops}</wsdl:binding>
<wsdl:service name="{SERVICE_NAME}"><wsdl:port name="{SERVICE_NAME}" binding="tns:{SERVICE_NAME}"><soap:address location="{location}"/></wsdl:port></wsdl:service>
</wsdl:definitions>
"#,
        location = escape(location),
    )
}
