// Tenancy endpoints. Tenants are looked up only; they are never created
// by the agent.

use crate::client::NetboxClient;
use crate::error::Error;
use crate::types::TenantResponse;

const TENANTS: &str = "tenancy/tenants/";

impl NetboxClient {
    pub async fn get_tenant_by_slug(&self, slug: &str) -> Result<Option<TenantResponse>, Error> {
        self.get_one(TENANTS, &[("slug", slug.to_owned())]).await
    }
}
