/* 📖 # Why typed OpenAPI structs instead of json!() literals?

The API description is produced in two places (live server and static export)
and read back in tests. Typed structs keep both producers in agreement, make the
document round-trip through serde, and keep optional fields out of the output
instead of emitting `null`.
*/

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use staticapi_base::StaticApiResult;

use crate::route::{RouteDefinition, RouteTable};

pub const OPENAPI_VERSION: &str = "3.0.3";

/// Route of the raw passthrough, in OpenAPI path template syntax.
pub const RAW_PASSTHROUGH_PATH: &str = "/raw/{path}";
pub const DEBUG_TAG: &str = "debug";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApiDocument {
    pub openapi: String,
    pub info: Info,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    pub paths: BTreeMap<String, PathItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info {
    pub title: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    pub responses: BTreeMap<String, Response>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: String,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub schema: Schema,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub description: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub content: BTreeMap<String, MediaType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    pub schema: Schema,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    #[serde(
        rename = "additionalProperties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<bool>,
}

impl Schema {
    fn of_type(schema_type: &str) -> Self {
        Self {
            schema_type: Some(schema_type.to_string()),
            additional_properties: None,
        }
    }

    /// A JSON object with arbitrary properties.
    pub fn any_object() -> Self {
        Self {
            schema_type: Some("object".to_string()),
            additional_properties: Some(true),
        }
    }

    /// No constraint at all (`{}`): any JSON value.
    pub fn any() -> Self {
        Self {
            schema_type: None,
            additional_properties: None,
        }
    }
}

/// Responses declared for every data route: the JSON file, or not found.
fn json_file_responses() -> BTreeMap<String, Response> {
    file_responses("JSON file contents", Schema::any_object())
}

/// The raw passthrough serves files verbatim, so it promises no particular shape.
fn raw_file_responses() -> BTreeMap<String, Response> {
    file_responses("File contents, served verbatim", Schema::any())
}

fn file_responses(description: &str, schema: Schema) -> BTreeMap<String, Response> {
    let mut content = BTreeMap::new();
    content.insert("application/json".to_string(), MediaType { schema });

    let mut responses = BTreeMap::new();
    responses.insert(
        "200".to_string(),
        Response {
            description: description.to_string(),
            content,
        },
    );
    responses.insert(
        "404".to_string(),
        Response {
            description: "Not found".to_string(),
            content: BTreeMap::new(),
        },
    );
    responses
}

fn route_operation(route: &RouteDefinition) -> Operation {
    Operation {
        tags: route.tags.clone(),
        summary: route.summary.clone(),
        description: route.description.clone(),
        parameters: vec![],
        responses: json_file_responses(),
    }
}

/// Build the API description with one GET operation per route.
pub fn build_openapi(routes: &RouteTable, info: Info) -> OpenApiDocument {
    let paths = routes
        .iter()
        .map(|route| {
            (
                route.path.clone(),
                PathItem {
                    get: Some(route_operation(route)),
                },
            )
        })
        .collect();

    OpenApiDocument {
        openapi: OPENAPI_VERSION.to_string(),
        info,
        servers: vec![],
        tags: vec![],
        paths,
    }
}

impl OpenApiDocument {
    pub fn with_server(mut self, url: impl Into<String>) -> Self {
        self.servers.push(Server { url: url.into() });
        self
    }

    /// Declare a top-level tag, keeping existing ones.
    pub fn with_tag(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.tags.iter().any(|tag| tag.name == name) {
            self.tags.push(Tag { name });
        }
        self
    }

    /// Declare every tag used by an operation, in sorted order.
    pub fn with_operation_tags(self) -> Self {
        let used: BTreeSet<String> = self
            .paths
            .values()
            .filter_map(|item| item.get.as_ref())
            .flat_map(|operation| operation.tags.iter().cloned())
            .collect();
        used.into_iter().fold(self, |doc, tag| doc.with_tag(tag))
    }

    /// Describe the `/raw/{path}` debug passthrough of the live server.
    pub fn with_raw_passthrough(mut self) -> Self {
        self.paths.insert(
            RAW_PASSTHROUGH_PATH.to_string(),
            PathItem {
                get: Some(Operation {
                    tags: vec![DEBUG_TAG.to_string()],
                    summary: Some("Serve raw files from the data root".to_string()),
                    description: Some(
                        "Convenience endpoint to view the raw JSON without OpenAPI shape."
                            .to_string(),
                    ),
                    parameters: vec![Parameter {
                        name: "path".to_string(),
                        location: "path".to_string(),
                        required: true,
                        description: Some("File path relative to the data root".to_string()),
                        schema: Schema::of_type("string"),
                    }],
                    responses: raw_file_responses(),
                }),
            },
        );
        self.with_tag(DEBUG_TAG)
    }

    pub fn to_json(&self) -> StaticApiResult<String> {
        serde_json::to_string(self)
            .map_err(|e| staticapi_base::err!("Failed to serialize API description: {}", e))
    }

    pub fn to_json_pretty(&self) -> StaticApiResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| staticapi_base::err!("Failed to serialize API description: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walker::derive_routes;
    use expect_test::expect;
    use staticapi_base::{FilePath, MockPal, PalHandle};

    fn info() -> Info {
        Info {
            title: "KERI Static Data API".to_string(),
            version: "0.1.0".to_string(),
            description: None,
        }
    }

    fn routes(files: &[&str]) -> RouteTable {
        let mock = MockPal::new();
        for file in files {
            mock.add_file(*file, "{}");
        }
        derive_routes(
            &PalHandle::new(mock),
            &["kel", "ksn", "tel"],
            &FilePath::from("data"),
        )
        .unwrap()
        .routes
    }

    #[test]
    fn test_single_route_document() {
        let doc = build_openapi(&routes(&["data/kel/sample-id/data.json"]), info());
        expect![[r#"
            {
              "openapi": "3.0.3",
              "info": {
                "title": "KERI Static Data API",
                "version": "0.1.0"
              },
              "paths": {
                "/kel/sample-id/data": {
                  "get": {
                    "tags": [
                      "KEL"
                    ],
                    "responses": {
                      "200": {
                        "description": "JSON file contents",
                        "content": {
                          "application/json": {
                            "schema": {
                              "type": "object",
                              "additionalProperties": true
                            }
                          }
                        }
                      },
                      "404": {
                        "description": "Not found"
                      }
                    }
                  }
                }
              }
            }"#]]
        .assert_eq(&doc.to_json_pretty().unwrap());
    }

    #[test]
    fn test_servers_and_tags() {
        let doc = build_openapi(
            &routes(&["data/tel/a.json", "data/kel/b.json", "data/kel/c.json"]),
            info(),
        )
        .with_server("./")
        .with_operation_tags();

        assert_eq!(doc.servers, vec![Server { url: "./".to_string() }]);
        let tags: Vec<&str> = doc.tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(tags, vec!["KEL", "TEL"]);
    }

    #[test]
    fn test_raw_passthrough() {
        let doc = build_openapi(&routes(&["data/kel/a.json"]), info())
            .with_operation_tags()
            .with_raw_passthrough();

        let raw = doc.paths[RAW_PASSTHROUGH_PATH].get.as_ref().unwrap();
        assert_eq!(raw.tags, vec![DEBUG_TAG]);
        assert_eq!(raw.parameters[0].location, "path");
        let served = &raw.responses["200"].content["application/json"];
        assert_eq!(served.schema, Schema::any());
        assert_eq!(serde_json::to_string(&served.schema).unwrap(), "{}");
        let tags: Vec<&str> = doc.tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(tags, vec!["KEL", "debug"]);
    }

    #[test]
    fn test_document_round_trips_through_json() {
        let doc = build_openapi(&routes(&["data/kel/a.json", "data/ksn/b/c.json"]), info())
            .with_server("./")
            .with_raw_passthrough();

        let parsed: OpenApiDocument = serde_json::from_str(&doc.to_json().unwrap()).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_summary_and_description_emitted() {
        let mock = MockPal::new();
        mock.add_file("data/kel/metadata.json", r#"{"summary":"S","description":"D"}"#);
        mock.add_file("data/kel/a.json", "{}");
        let table = derive_routes(&PalHandle::new(mock), &["kel"], &FilePath::from("data"))
            .unwrap()
            .routes;

        let doc = build_openapi(&table, info());
        let operation = doc.paths["/kel/a"].get.as_ref().unwrap();
        assert_eq!(operation.summary.as_deref(), Some("S"));
        assert_eq!(operation.description.as_deref(), Some("D"));
        assert_eq!(
            operation.responses.keys().collect::<Vec<_>>(),
            vec!["200", "404"]
        );
    }
}
