//! Records, output resources and input models of the world service

use hateoas::prelude::*;

/// Stored world
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldRecord {
    pub id: Uuid,
    pub world_name: String,
    pub tenant_name: String,
    pub server_ip: String,
    pub population: i64,
    pub created_at: DateTime<FixedOffset>,
}

impl_field_source!(WorldRecord {
    world_name,
    tenant_name,
    population,
    created_at,
});

/// Stored resident of a world
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResidentRecord {
    pub id: Uuid,
    pub world_id: Uuid,
    pub name: String,
    pub role: String,
}

impl_field_source!(ResidentRecord {
    world_id,
    name,
    role,
});

/// World as clients see it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldRest {
    #[serde(rename = "self")]
    pub self_link: Link,
    pub world_name: String,
    pub tenant_name: String,
    pub population: i64,
    pub created_at: DateTime<FixedOffset>,
    pub residents: Link,
    pub create_resident: Form,
}

impl_searchable!(WorldRest, "worlds", {
    "worldName" => world_name: String [searchable, sortable],
    "tenantName" => tenant_name: String [searchable, sortable],
    "population" => population: Integer [searchable, sortable],
    "createdAt" => created_at: DateTimeOffset [searchable, sortable],
});

impl_hypermedia!(WorldRest {
    self_link,
    residents,
    create_resident,
});

impl Etaggable for WorldRest {}

impl From<WorldRecord> for WorldRest {
    fn from(record: WorldRecord) -> Self {
        Self {
            self_link: Link::to("GetWorldById").with_param("worldId", record.id),
            residents: Link::to_collection("GetResidents").with_param("worldId", record.id),
            create_resident: Form::for_model::<ResidentForm>(
                Link::to_form("CreateResident", axum::http::Method::POST, relation::CREATE_FORM)
                    .with_param("worldId", record.id),
            ),
            world_name: record.world_name,
            tenant_name: record.tenant_name,
            population: record.population,
            created_at: record.created_at,
        }
    }
}

/// Resident as clients see it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResidentRest {
    #[serde(rename = "self")]
    pub self_link: Link,
    pub world: Link,
    pub name: String,
    pub role: String,
}

impl_searchable!(ResidentRest, "residents", {
    "name" => name: String [searchable, sortable],
    "role" => role: String [searchable, sortable],
    "worldId" => world_id: Uuid [searchable],
});

impl_hypermedia!(ResidentRest { self_link, world });

impl From<ResidentRecord> for ResidentRest {
    fn from(record: ResidentRecord) -> Self {
        Self {
            self_link: Link::to("GetResidentById")
                .with_param("worldId", record.world_id)
                .with_param("residentId", record.id),
            world: Link::to("GetWorldById").with_param("worldId", record.world_id),
            name: record.name,
            role: record.role,
        }
    }
}

/// Body of a resident creation request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResidentForm {
    pub name: String,
    pub role: String,
}

impl_form_model!(ResidentForm {
    "name" => "Name" [required, length(1, 100)],
    "role" => "Role" [description("Free text, e.g. mayor or farmer")],
});

/// OAuth password grant; the grant type is fixed
#[derive(Debug, Clone, Serialize)]
pub struct PasswordGrantForm {
    pub grant_type: String,
    pub username: String,
    pub password: String,
}

impl Default for PasswordGrantForm {
    fn default() -> Self {
        Self {
            grant_type: "password".to_string(),
            username: String::new(),
            password: String::new(),
        }
    }
}

impl_form_model!(PasswordGrantForm {
    "grant_type" => "Grant type" [required],
    "username" => "Email" [required, description("Email address of the account")],
    "password" => "Password" [required, secret, length(8, 100)],
});

/// Entry point of the API
#[derive(Debug, Clone, Serialize)]
pub struct RootResource {
    #[serde(rename = "self")]
    pub self_link: Link,
    pub worlds: Link,
    pub token: Link,
}

impl_hypermedia!(RootResource {
    self_link,
    worlds,
    token,
});
