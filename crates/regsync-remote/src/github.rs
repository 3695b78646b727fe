use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::{RemoteError, Result},
    types::{Release, ReleaseAsset, RepoRef},
};

pub const GRAPHQL_URL: &str = "https://api.github.com/graphql";
pub const API_URL: &str = "https://api.github.com";
pub const RELEASES_PER_PAGE: u32 = 100;

const RELEASES_QUERY: &str = r#"query($owner: String!, $name: String!, $perPage: Int!, $endCursor: String) {
  repository(owner: $owner, name: $name) {
    releases(first: $perPage, orderBy: {field: CREATED_AT, direction: DESC}, after: $endCursor) {
      pageInfo { hasNextPage endCursor }
      nodes {
        tagName
        isDraft
        isPrerelease
        createdAt
        releaseAssets(first: 100) { nodes { name downloadUrl } }
      }
    }
  }
}"#;

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<QueryData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    repository: Option<RepositoryNode>,
}

#[derive(Debug, Deserialize)]
struct RepositoryNode {
    releases: ReleaseConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReleaseConnection {
    page_info: PageInfo,
    nodes: Vec<ReleaseNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReleaseNode {
    tag_name: String,
    is_draft: bool,
    is_prerelease: bool,
    created_at: Option<String>,
    release_assets: AssetConnection,
}

#[derive(Debug, Deserialize)]
struct AssetConnection {
    nodes: Vec<AssetNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetNode {
    name: String,
    download_url: String,
}

/// Request body for one page of releases, newest first.
pub fn releases_request(repo: &RepoRef, cursor: Option<&str>) -> Value {
    json!({
        "query": RELEASES_QUERY,
        "variables": {
            "owner": repo.owner,
            "name": repo.name,
            "perPage": RELEASES_PER_PAGE,
            "endCursor": cursor,
        }
    })
}

/// One page of published releases and the cursor of the next page, if any.
#[derive(Debug)]
pub struct ReleasePage {
    pub releases: Vec<Release>,
    pub next_cursor: Option<String>,
}

/// Decodes a releases page, dropping drafts and prereleases.
pub fn parse_releases_page(repo: &RepoRef, body: Value) -> Result<ReleasePage> {
    let response: GraphQlResponse = serde_json::from_value(body)
        .map_err(|err| RemoteError::invalid(GRAPHQL_URL, err.to_string()))?;

    if !response.errors.is_empty() {
        return Err(RemoteError::GraphQl {
            repository: repo.to_string(),
            messages: response.errors.into_iter().map(|e| e.message).collect(),
        });
    }

    let connection = response
        .data
        .and_then(|data| data.repository)
        .map(|repository| repository.releases)
        .ok_or_else(|| {
            RemoteError::GraphQl {
                repository: repo.to_string(),
                messages: vec!["repository not found".into()],
            }
        })?;

    let releases = connection
        .nodes
        .into_iter()
        .filter(|node| !node.is_draft && !node.is_prerelease)
        .map(|node| {
            Release {
                tag_name: node.tag_name,
                created_at: node.created_at,
                assets: node
                    .release_assets
                    .nodes
                    .into_iter()
                    .map(|asset| ReleaseAsset::new(asset.name, asset.download_url))
                    .collect(),
            }
        })
        .collect();

    let next_cursor = if connection.page_info.has_next_page {
        connection.page_info.end_cursor
    } else {
        None
    };

    Ok(ReleasePage {
        releases,
        next_cursor,
    })
}

pub fn public_membership_url(org: &str, user: &str) -> String {
    format!("{API_URL}/orgs/{org}/public_members/{user}")
}
