//! OpenAPI document assembly for `/api/schema`.
//!
//! The document is assembled from per-collection path fragments plus the
//! system paths, mirroring how the routes themselves are registered. It is
//! static apart from the crate version, so the handler just serializes a
//! freshly built value.

use axum::Json;
use serde_json::{json, Value};

use crate::devices::catalog::Collection;
use crate::devices::DeviceKind;

/// GET /api/schema - The OpenAPI document
pub async fn get_schema() -> Json<Value> {
    Json(openapi_document())
}

/// Assemble the full OpenAPI 3.1 document.
pub fn openapi_document() -> Value {
    let mut paths = json!({
        "/": {
            "get": {
                "summary": "User: API Documentation",
                "description": "Access this API console"
            }
        },
        "/api/schema": {
            "get": {
                "summary": "Schema: Definition",
                "description": "Fetch the OpenAPI schema document for this API"
            }
        }
    });
    merge(&mut paths, collection_paths(Collection::Signals));
    merge(&mut paths, collection_paths(Collection::Turnouts));
    merge(&mut paths, system_paths());

    json!({
        "openapi": "3.1.0",
        "info": {
            "title": "Trackside Controller",
            "version": env!("CARGO_PKG_VERSION")
        },
        "components": {
            "schemas": {
                "Signal": device_schema(DeviceKind::GermanHauptsignal),
                "Turnout": device_schema(DeviceKind::TwoPinSolenoidTurnout)
            }
        },
        "paths": paths
    })
}

/// CRUD path fragment for one collection.
fn collection_paths(collection: Collection) -> Value {
    let name = collection.as_str();
    let (label, schema, states) = match collection {
        Collection::Signals => ("Signal", "Signal", "off | danger | clear | slow"),
        Collection::Turnouts => ("Turnout", "Turnout", "off | straight | turn"),
    };
    let schema_ref = format!("#/components/schemas/{schema}");
    let lower = label.to_lowercase();
    let list_path = format!("/api/{name}");
    let item_path = format!("/api/{name}/{{id}}");
    json!({
        (list_path): {
            "get": {
                "summary": format!("{label}: List"),
                "description": format!("List all registered {name} in creation order."),
                "responses": {
                    "200": {"description": format!("The registered {name}.")}
                }
            },
            "post": {
                "summary": format!("{label}: Create"),
                "description": format!("Register and activate a new {lower}."),
                "requestBody": {
                    "content": {"application/json": {"schema": {"$ref": schema_ref}}},
                    "required": true
                },
                "responses": {
                    "200": {"description": format!("The created {lower}.")},
                    "400": {"description": "The configuration is invalid or the id is taken."}
                }
            }
        },
        (item_path): {
            "get": {
                "summary": format!("{label}: Fetch"),
                "responses": {
                    "200": {"description": format!("The requested {lower}.")},
                    "404": {"description": "No device with this id."}
                }
            },
            "patch": {
                "summary": format!("{label}: Update"),
                "description": format!("Set the state ({states})."),
                "responses": {
                    "200": {"description": "The updated device."},
                    "400": {"description": "The requested state is not valid for this device."},
                    "404": {"description": "No device with this id."}
                }
            },
            "delete": {
                "summary": format!("{label}: Delete"),
                "description": "Switch the device off and remove it.",
                "responses": {
                    "200": {"description": "The device has been removed."},
                    "404": {"description": "No device with this id."}
                }
            }
        }
    })
}

/// Creation-record schema for one device type.
fn device_schema(kind: DeviceKind) -> Value {
    let params = match kind {
        DeviceKind::GermanHauptsignal => json!({
            "type": "object",
            "properties": {
                "red_pin": {"type": "integer"},
                "green_pin": {"type": "integer"},
                "yellow_pin": {"type": "integer"}
            },
            "required": ["red_pin", "green_pin"]
        }),
        DeviceKind::TwoPinSolenoidTurnout => json!({
            "type": "object",
            "properties": {
                "enable_pin": {"type": "integer"},
                "direction_pin": {"type": "integer"},
                "turnout_high": {"type": "boolean"}
            },
            "required": ["enable_pin", "direction_pin", "turnout_high"]
        }),
    };
    json!({
        "type": "object",
        "properties": {
            "id": {"type": "string"},
            "type": {"type": "string", "const": kind.tag()},
            "params": params
        },
        "required": ["id", "type", "params"]
    })
}

/// Path fragment for the system endpoints.
fn system_paths() -> Value {
    json!({
        "/api/system": {
            "get": {
                "summary": "System: Status",
                "description": "Retrieve the current system status.",
                "responses": {
                    "200": {"description": "The current status of the system."}
                }
            },
            "delete": {
                "summary": "System: Shutdown",
                "description": "Shut down the system, powering off all attached devices.",
                "responses": {
                    "202": {"description": "The shutdown process has started"}
                }
            },
            "patch": {
                "summary": "System: Update",
                "description": "Update a single file on the system",
                "parameters": [
                    {
                        "name": "X-Filename",
                        "in": "header",
                        "required": true,
                        "description": "The filename to save the uploaded file at."
                    },
                    {
                        "name": "Content-Length",
                        "in": "header",
                        "required": true,
                        "description": "The length of the uploaded file."
                    }
                ],
                "requestBody": {
                    "description": "The file to upload",
                    "content": {"*/*": {}},
                    "required": true
                },
                "responses": {
                    "204": {"description": "The file has been updated"},
                    "411": {"description": "The Content-Length header must be specified"},
                    "422": {"description": "The X-Filename header must be specified"}
                }
            }
        },
        "/api/system/restart": {
            "post": {
                "summary": "System: Restart",
                "description": "Restart the system",
                "responses": {
                    "202": {"description": "The restart has started."}
                }
            }
        }
    })
}

/// Merge a fragment's top-level keys into `target`.
fn merge(target: &mut Value, fragment: Value) {
    if let (Some(target), Some(fragment)) = (target.as_object_mut(), fragment.as_object()) {
        for (key, value) in fragment {
            target.insert(key.clone(), value.clone());
        }
    }
}
