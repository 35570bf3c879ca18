// src/model.rs
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::RouteError;

/// ルートが何を描画するか
///
/// ルーター側の定義では component / components / redirect は排他的なので、
/// 4 つの Option ではなくタグ付きの列挙型で表す。
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RenderSpec {
    /// `component` による単一ビュー (識別子や遅延 import 式のソース文字列)
    SingleView(String),
    /// `components` による名前付きビュー
    NamedViews(BTreeMap<String, String>),
    /// `redirect` (パス文字列またはロケーションオブジェクト)
    Redirect(Value),
    /// 何も描画しない
    #[default]
    None,
}

impl RenderSpec {
    /// 個別のフィールドから RenderSpec を組み立てる
    ///
    /// 2 つ以上指定されていれば `ConflictingRenderSpec` を返す。
    /// `path` はエラーメッセージ用。
    pub fn from_parts(
        path: &str,
        component: Option<String>,
        components: Option<BTreeMap<String, String>>,
        redirect: Option<Value>,
    ) -> Result<Self, RouteError> {
        match (component, components, redirect) {
            (None, None, None) => Ok(RenderSpec::None),
            (Some(c), None, None) => Ok(RenderSpec::SingleView(c)),
            (None, Some(cs), None) => Ok(RenderSpec::NamedViews(cs)),
            (None, None, Some(r)) => Ok(RenderSpec::Redirect(r)),
            (c, cs, r) => {
                let mut fields = Vec::new();
                if c.is_some() {
                    fields.push("component");
                }
                if cs.is_some() {
                    fields.push("components");
                }
                if r.is_some() {
                    fields.push("redirect");
                }
                Err(RouteError::ConflictingRenderSpec {
                    path: path.to_string(),
                    fields,
                })
            }
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, RenderSpec::None)
    }
}

/// ルート定義ツリーの 1 ノード
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawRouteRecord", into = "RawRouteRecord")]
pub struct RouteNode {
    /// 親からの相対パス (例: "users", ":id", ""(空文字) など)
    pub path: String,

    pub render: RenderSpec,

    /// 子ルート。無い場合は空
    pub children: Vec<RouteNode>,

    /// name / meta / props / alias など、平坦化に関係しないフィールドをそのまま保持する
    pub extra: Map<String, Value>,
}

impl RouteNode {
    pub fn new(path: impl Into<String>, render: RenderSpec) -> Self {
        RouteNode {
            path: path.into(),
            render,
            ..Default::default()
        }
    }

    pub fn with_children(mut self, children: Vec<RouteNode>) -> Self {
        self.children = children;
        self
    }
}

/// 1 つのソースファイルから抽出したルート一覧
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteTable {
    /// ルート定義が書かれているソースファイルへの絶対パス
    pub source_file: PathBuf,
    pub routes: Vec<RouteNode>,
}

/// ルーターが受け取るレコードそのままの JSON 形状
#[derive(Serialize, Deserialize)]
struct RawRouteRecord {
    #[serde(default)]
    path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    component: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    components: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    redirect: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<RouteNode>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl TryFrom<RawRouteRecord> for RouteNode {
    type Error = RouteError;

    fn try_from(raw: RawRouteRecord) -> Result<Self, Self::Error> {
        let render = RenderSpec::from_parts(&raw.path, raw.component, raw.components, raw.redirect)?;
        Ok(RouteNode {
            path: raw.path,
            render,
            children: raw.children,
            extra: raw.extra,
        })
    }
}

impl From<RouteNode> for RawRouteRecord {
    fn from(node: RouteNode) -> Self {
        let (component, components, redirect) = match node.render {
            RenderSpec::SingleView(c) => (Some(c), None, None),
            RenderSpec::NamedViews(cs) => (None, Some(cs), None),
            RenderSpec::Redirect(r) => (None, None, Some(r)),
            RenderSpec::None => (None, None, None),
        };
        RawRouteRecord {
            path: node.path,
            component,
            components,
            redirect,
            children: node.children,
            extra: node.extra,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_each_render_variant() {
        let routes: Vec<RouteNode> = serde_json::from_value(json!([
            { "path": "home", "component": "HomeView" },
            { "path": "split", "components": { "default": "Main", "side": "Side" } },
            { "path": "old", "redirect": { "name": "home" } },
            { "path": "group", "children": [{ "path": "a", "component": "A" }] }
        ]))
        .unwrap();

        assert_eq!(routes[0].render, RenderSpec::SingleView("HomeView".into()));
        match &routes[1].render {
            RenderSpec::NamedViews(views) => assert_eq!(views.len(), 2),
            other => panic!("unexpected render spec: {:?}", other),
        }
        assert_eq!(routes[2].render, RenderSpec::Redirect(json!({ "name": "home" })));
        assert!(routes[3].render.is_none());
        assert_eq!(routes[3].children.len(), 1);
    }

    #[test]
    fn rejects_conflicting_render_fields() {
        let err = serde_json::from_value::<RouteNode>(json!({
            "path": "x",
            "component": "X",
            "redirect": "/y"
        }))
        .unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("component"), "{msg}");
        assert!(msg.contains("redirect"), "{msg}");
    }

    #[test]
    fn keeps_unknown_fields_and_omits_empty_children() {
        let input = json!({
            "path": "about",
            "name": "about",
            "meta": { "requiresAuth": true },
            "component": "AboutView",
            "children": []
        });
        let node: RouteNode = serde_json::from_value(input).unwrap();
        assert_eq!(node.extra["name"], json!("about"));

        let out = serde_json::to_value(&node).unwrap();
        assert_eq!(
            out,
            json!({
                "path": "about",
                "name": "about",
                "meta": { "requiresAuth": true },
                "component": "AboutView"
            })
        );
    }

    #[test]
    fn missing_path_is_empty_string() {
        let node: RouteNode = serde_json::from_value(json!({ "component": "X" })).unwrap();
        assert_eq!(node.path, "");
    }
}
