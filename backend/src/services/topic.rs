//! Topic hierarchy service

use crate::error::{ApiError, ApiResult};
use crate::repositories::{NewTopic, StoreError, TopicRecord, TopicRepository};
use blog_shared::validation::validate_slug;
use blog_shared::{ConflictCode, TopicDetailResponse, TopicNode, TopicRequest, TopicResponse, TopicSummary};
use std::collections::{BTreeMap, HashMap};
use tracing::info;
use uuid::Uuid;

/// Topic service
pub struct TopicService;

impl TopicService {
    pub async fn create(topics: &dyn TopicRepository, req: TopicRequest) -> ApiResult<TopicResponse> {
        let mut errors = BTreeMap::new();
        let name = req.name.as_deref().map(str::trim).unwrap_or_default();
        let slug = req.slug.as_deref().map(|s| s.trim().to_lowercase()).unwrap_or_default();
        if name.is_empty() {
            errors.insert("name".to_string(), "Name is required".to_string());
        }
        if let Err(message) = validate_slug(&slug) {
            errors.insert("slug".to_string(), message);
        }
        if !errors.is_empty() {
            return Err(ApiError::validation(errors));
        }

        let parent = match req.parent_id {
            Some(parent_id) => Some(load_parent(topics, parent_id).await?),
            None => None,
        };

        let topic = topics
            .create(NewTopic {
                name: name.to_string(),
                slug,
                parent_id: req.parent_id,
                sort_order: req.order.unwrap_or(0),
            })
            .await
            .map_err(slug_conflict)?;

        info!(topic_id = %topic.id, slug = %topic.slug, "Topic created");
        Ok(to_response(topic, parent.as_ref()))
    }

    /// Update present fields. Re-parenting must keep the hierarchy acyclic.
    pub async fn update(
        topics: &dyn TopicRepository,
        id: Uuid,
        req: TopicRequest,
    ) -> ApiResult<TopicResponse> {
        let mut topic = load(topics, id).await?;

        if let Some(name) = req.name.as_deref().map(str::trim) {
            if name.is_empty() {
                return Err(ApiError::field("name", "Name cannot be empty"));
            }
            topic.name = name.to_string();
        }
        if let Some(slug) = req.slug.as_deref().map(|s| s.trim().to_lowercase()) {
            validate_slug(&slug).map_err(|e| ApiError::field("slug", e))?;
            topic.slug = slug;
        }
        if let Some(parent_id) = req.parent_id {
            if parent_id == id {
                return Err(ApiError::field("parentId", "A topic cannot be its own parent"));
            }
            if is_descendant(topics, parent_id, id).await? {
                return Err(ApiError::field(
                    "parentId",
                    "A topic cannot be moved beneath its own descendant",
                ));
            }
            topic.parent_id = Some(parent_id);
        }
        if let Some(order) = req.order {
            topic.sort_order = order;
        }

        let parent = match topic.parent_id {
            Some(parent_id) => Some(load_parent(topics, parent_id).await?),
            None => None,
        };
        let topic = topics.update(&topic).await.map_err(slug_conflict)?;

        info!(topic_id = %topic.id, "Topic updated");
        Ok(to_response(topic, parent.as_ref()))
    }

    /// Delete a topic with no children and no posts
    pub async fn delete(topics: &dyn TopicRepository, id: Uuid) -> ApiResult<()> {
        let topic = load(topics, id).await?;

        if topics.count_children(id).await? > 0 {
            return Err(ApiError::BadRequest(
                "Cannot delete a topic that has child topics".to_string(),
            ));
        }
        if topics.count_posts(id).await? > 0 {
            return Err(ApiError::BadRequest(
                "Cannot delete a topic that has posts".to_string(),
            ));
        }

        topics.delete(id).await?;
        info!(topic_id = %id, slug = %topic.slug, "Topic deleted");
        Ok(())
    }

    /// Flat list in display order, each with its parent summary
    pub async fn list(topics: &dyn TopicRepository) -> ApiResult<Vec<TopicResponse>> {
        let all = topics.list().await?;
        let by_id: HashMap<Uuid, TopicRecord> = all.iter().map(|t| (t.id, t.clone())).collect();

        Ok(all
            .into_iter()
            .map(|t| {
                let parent = t.parent_id.and_then(|p| by_id.get(&p));
                to_response(t, parent)
            })
            .collect())
    }

    /// Full hierarchy, roots first, siblings in display order
    pub async fn tree(topics: &dyn TopicRepository) -> ApiResult<Vec<TopicNode>> {
        Ok(build_tree(topics.list().await?))
    }

    /// Topic by slug with its parent and ordered children
    pub async fn detail(topics: &dyn TopicRepository, slug: &str) -> ApiResult<TopicDetailResponse> {
        let all = topics.list().await?;
        let topic = all
            .iter()
            .find(|t| t.slug == slug)
            .cloned()
            .ok_or_else(|| ApiError::not_found("Topic not found"))?;

        let parent = topic
            .parent_id
            .and_then(|p| all.iter().find(|t| t.id == p));
        let children = all
            .iter()
            .filter(|t| t.parent_id == Some(topic.id))
            .map(|t| to_response(t.clone(), Some(&topic)))
            .collect();

        Ok(TopicDetailResponse {
            topic: to_response(topic, parent),
            children,
        })
    }
}

/// Assemble nested nodes from a flat, ordered list
pub fn build_tree(all: Vec<TopicRecord>) -> Vec<TopicNode> {
    let mut by_parent: HashMap<Option<Uuid>, Vec<TopicRecord>> = HashMap::new();
    for topic in all {
        by_parent.entry(topic.parent_id).or_default().push(topic);
    }

    fn nodes(parent: Option<Uuid>, by_parent: &mut HashMap<Option<Uuid>, Vec<TopicRecord>>) -> Vec<TopicNode> {
        let Some(level) = by_parent.remove(&parent) else {
            return Vec::new();
        };
        level
            .into_iter()
            .map(|t| TopicNode {
                children: nodes(Some(t.id), by_parent),
                id: t.id,
                name: t.name,
                slug: t.slug,
                order: t.sort_order,
                parent_id: t.parent_id,
            })
            .collect()
    }

    nodes(None, &mut by_parent)
}

/// Whether `candidate` sits anywhere beneath `ancestor`
async fn is_descendant(
    topics: &dyn TopicRepository,
    candidate: Uuid,
    ancestor: Uuid,
) -> ApiResult<bool> {
    let mut current = Some(candidate);
    let mut hops = 0;
    while let Some(id) = current {
        if id == ancestor {
            return Ok(true);
        }
        hops += 1;
        if hops > 1_000 {
            break;
        }
        current = match topics.find_by_id(id).await? {
            Some(topic) => topic.parent_id,
            None => None,
        };
    }
    Ok(false)
}

async fn load(topics: &dyn TopicRepository, id: Uuid) -> ApiResult<TopicRecord> {
    topics
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Topic not found"))
}

async fn load_parent(topics: &dyn TopicRepository, id: Uuid) -> ApiResult<TopicRecord> {
    topics
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::field("parentId", "Parent topic not found"))
}

fn to_response(topic: TopicRecord, parent: Option<&TopicRecord>) -> TopicResponse {
    TopicResponse {
        id: topic.id,
        name: topic.name,
        slug: topic.slug,
        parent_id: topic.parent_id,
        order: topic.sort_order,
        parent: parent.map(|p| TopicSummary {
            id: p.id,
            name: p.name.clone(),
            slug: p.slug.clone(),
        }),
        created_at: topic.created_at,
        updated_at: topic.updated_at,
    }
}

fn slug_conflict(err: StoreError) -> ApiError {
    match err {
        StoreError::Conflict(_) => {
            ApiError::conflict(ConflictCode::SlugExists, "A topic with this slug already exists")
        }
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{InMemoryStore, NewPost, NewUser, PostRepository, UserRepository};
    use blog_shared::{ContentType, PostStatus, Role};

    fn req(name: &str, slug: &str, parent_id: Option<Uuid>) -> TopicRequest {
        TopicRequest {
            name: Some(name.to_string()),
            slug: Some(slug.to_string()),
            parent_id,
            order: None,
        }
    }

    #[tokio::test]
    async fn test_tree_nests_arbitrary_depth() {
        let store = InMemoryStore::new();
        let root = TopicService::create(&store, req("Root", "root", None)).await.unwrap();
        let mid = TopicService::create(&store, req("Mid", "mid", Some(root.id))).await.unwrap();
        TopicService::create(&store, req("Leaf", "leaf", Some(mid.id))).await.unwrap();
        TopicService::create(&store, req("Other", "other", None)).await.unwrap();

        let tree = TopicService::tree(&store).await.unwrap();
        assert_eq!(tree.len(), 2);
        let root_node = tree.iter().find(|n| n.slug == "root").unwrap();
        assert_eq!(root_node.children[0].slug, "mid");
        assert_eq!(root_node.children[0].children[0].slug, "leaf");
    }

    #[tokio::test]
    async fn test_cannot_move_under_descendant() {
        let store = InMemoryStore::new();
        let root = TopicService::create(&store, req("Root", "root", None)).await.unwrap();
        let child = TopicService::create(&store, req("Child", "child", Some(root.id))).await.unwrap();

        let move_under_child = TopicRequest {
            parent_id: Some(child.id),
            ..Default::default()
        };
        assert!(TopicService::update(&store, root.id, move_under_child).await.is_err());

        let own_parent = TopicRequest {
            parent_id: Some(root.id),
            ..Default::default()
        };
        assert!(TopicService::update(&store, root.id, own_parent).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_guarded_by_children() {
        let store = InMemoryStore::new();
        let root = TopicService::create(&store, req("Root", "root", None)).await.unwrap();
        TopicService::create(&store, req("Child", "child", Some(root.id))).await.unwrap();

        let err = TopicService::delete(&store, root.id).await.unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
        assert!(TopicRepository::find_by_id(&store, root.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_guarded_by_posts() {
        let store = InMemoryStore::new();
        let topic = TopicService::create(&store, req("Solo", "solo", None)).await.unwrap();
        let author = UserRepository::create(
            &store,
            NewUser {
                email: "a@x.com".to_string(),
                username: "author".to_string(),
                password_hash: "hash".to_string(),
                first_name: "A".to_string(),
                last_name: "B".to_string(),
                role: Role::User,
            },
        )
        .await
        .unwrap();
        PostRepository::create(
            &store,
            NewPost {
                title: "Post".to_string(),
                slug: "post".to_string(),
                content: "body".to_string(),
                html_content: None,
                content_type: ContentType::Markdown,
                excerpt: None,
                status: PostStatus::Draft,
                publish_date: None,
                is_scheduled: false,
                author_id: author.id,
                topic_id: Some(topic.id),
                preview_image_url: None,
                sort_order: 0,
                read_time: 1,
            },
        )
        .await
        .unwrap();

        assert!(TopicService::delete(&store, topic.id).await.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_slug_conflicts() {
        let store = InMemoryStore::new();
        TopicService::create(&store, req("Rust", "rust", None)).await.unwrap();
        let err = TopicService::create(&store, req("Rust again", "RUST", None))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict { code: ConflictCode::SlugExists, .. }));
    }

    #[tokio::test]
    async fn test_detail_has_parent_and_children() {
        let store = InMemoryStore::new();
        let root = TopicService::create(&store, req("Root", "root", None)).await.unwrap();
        let mid = TopicService::create(&store, req("Mid", "mid", Some(root.id))).await.unwrap();
        TopicService::create(&store, req("Leaf", "leaf", Some(mid.id))).await.unwrap();

        let detail = TopicService::detail(&store, "mid").await.unwrap();
        assert_eq!(detail.topic.parent.unwrap().slug, "root");
        assert_eq!(detail.children.len(), 1);
        assert_eq!(detail.children[0].slug, "leaf");
    }
}
