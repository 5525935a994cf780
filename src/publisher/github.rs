use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use std::error::Error;

const GITHUB_API_BASE: &str = "https://api.github.com";

/// Branch the reports are committed to, created from the default branch head
/// when absent.
pub const REPORT_BRANCH: &str = "sentinel-reports";

/// Commits report files to a GitHub branch through the REST git-data API:
/// blobs → tree → commit → ref. No local git state is touched.
pub struct GitHubPublisher {
    client: Client,
    token: String,
    slug: String,
}

#[derive(Debug, Deserialize)]
struct RepoInfo {
    default_branch: String,
}

#[derive(Debug, Deserialize)]
struct GitRef {
    object: GitObject,
}

#[derive(Debug, Deserialize)]
struct GitObject {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct GitCommit {
    tree: GitObject,
}

#[derive(Debug, Deserialize)]
struct Created {
    sha: String,
}

impl GitHubPublisher {
    pub fn new(token: String, slug: String) -> Self {
        Self {
            client: Client::new(),
            token,
            slug,
        }
    }

    /// Stage and commit `files` (name, markdown content) under `dir_name/` on
    /// the report branch. Returns the new commit sha.
    pub async fn push_reports(
        &self,
        dir_name: &str,
        files: &[(String, String)],
    ) -> Result<String, Box<dyn Error + Send + Sync>> {
        let repo: RepoInfo = self.get(&format!("/repos/{}", self.slug)).await?;

        let base_sha = match self.find_branch(REPORT_BRANCH).await? {
            Some(sha) => sha,
            None => {
                let default_sha = self
                    .find_branch(&repo.default_branch)
                    .await?
                    .ok_or_else(|| format!("default branch '{}' not found", repo.default_branch))?;

                let _: serde_json::Value = self
                    .post(
                        &format!("/repos/{}/git/refs", self.slug),
                        serde_json::json!({
                            "ref": format!("refs/heads/{}", REPORT_BRANCH),
                            "sha": default_sha,
                        }),
                    )
                    .await?;

                println!("🌿 Created branch: {}", REPORT_BRANCH);
                default_sha
            }
        };

        let base_commit: GitCommit = self
            .get(&format!("/repos/{}/git/commits/{}", self.slug, base_sha))
            .await?;

        let mut tree_entries = Vec::new();
        for (name, content) in files {
            let blob: Created = self
                .post(
                    &format!("/repos/{}/git/blobs", self.slug),
                    serde_json::json!({ "content": content, "encoding": "utf-8" }),
                )
                .await?;

            tree_entries.push(serde_json::json!({
                "path": format!("{}/{}", dir_name, name),
                "mode": "100644",
                "type": "blob",
                "sha": blob.sha,
            }));
        }

        let tree: Created = self
            .post(
                &format!("/repos/{}/git/trees", self.slug),
                serde_json::json!({
                    "base_tree": base_commit.tree.sha,
                    "tree": tree_entries,
                }),
            )
            .await?;

        let message = format!(
            "Sentinel analysis report - {}",
            Utc::now().format("%Y-%m-%d %H:%M:%S")
        );

        let commit: Created = self
            .post(
                &format!("/repos/{}/git/commits", self.slug),
                serde_json::json!({
                    "message": message,
                    "tree": tree.sha,
                    "parents": [base_sha],
                }),
            )
            .await?;

        let _: serde_json::Value = self
            .patch(
                &format!("/repos/{}/git/refs/heads/{}", self.slug, REPORT_BRANCH),
                serde_json::json!({ "sha": commit.sha, "force": false }),
            )
            .await?;

        Ok(commit.sha)
    }

    /// Head sha of a branch, or `None` when the branch does not exist.
    async fn find_branch(
        &self,
        branch: &str,
    ) -> Result<Option<String>, Box<dyn Error + Send + Sync>> {
        let url = format!(
            "{}/repos/{}/git/ref/heads/{}",
            GITHUB_API_BASE, self.slug, branch
        );

        let response = self.request(self.client.get(&url)).send().await?;

        if response.status().as_u16() == 404 {
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(github_error(response).await);
        }

        let git_ref: GitRef = response.json().await?;
        Ok(Some(git_ref.object.sha))
    }

    async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
    ) -> Result<T, Box<dyn Error + Send + Sync>> {
        let url = format!("{}{}", GITHUB_API_BASE, path);
        let response = self.request(self.client.get(&url)).send().await?;

        if !response.status().is_success() {
            return Err(github_error(response).await);
        }

        Ok(response.json().await?)
    }

    async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, Box<dyn Error + Send + Sync>> {
        let url = format!("{}{}", GITHUB_API_BASE, path);
        let response = self.request(self.client.post(&url)).json(&body).send().await?;

        if !response.status().is_success() {
            return Err(github_error(response).await);
        }

        Ok(response.json().await?)
    }

    async fn patch<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, Box<dyn Error + Send + Sync>> {
        let url = format!("{}{}", GITHUB_API_BASE, path);
        let response = self.request(self.client.patch(&url)).json(&body).send().await?;

        if !response.status().is_success() {
            return Err(github_error(response).await);
        }

        Ok(response.json().await?)
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("Authorization", format!("Bearer {}", self.token))
            .header("User-Agent", "sentinel")
            .header("Accept", "application/vnd.github.v3+json")
    }
}

async fn github_error(response: reqwest::Response) -> Box<dyn Error + Send + Sync> {
    let status = response.status();
    let detail = response.text().await.unwrap_or_default();
    format!("GitHub API error: {} {}", status, detail).into()
}
