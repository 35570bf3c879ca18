// src/flatten.rs
//! 仮想ルート (パスの共有やグルーピングのためだけに存在するノード) を取り除き、
//! その子ルートを親の位置に展開する。

use log::debug;

use crate::model::RouteNode;

impl RouteNode {
    /// 仮想ルートかどうか
    ///
    /// path が空でなく、子ルートを持ち、何も描画しない (component / components / redirect が無い) ノード。
    pub fn is_virtual(&self) -> bool {
        !self.path.is_empty() && !self.children.is_empty() && self.render.is_none()
    }
}

/// 平坦化の途中で展開した仮想ルートの記録
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlattenReport {
    /// 展開した仮想ルートのパス (祖先の接頭辞を含む)。訪問順
    pub collapsed: Vec<String>,
}

/// 子ルートのパスに `prefix + "/"` を付ける
///
/// スラッシュの正規化はしない。`"a/"` と `"/b"` なら `"a///b"` になる。
pub fn apply_prefix(prefix: &str, routes: Vec<RouteNode>) -> Vec<RouteNode> {
    routes
        .into_iter()
        .map(|mut route| {
            route.path = format!("{}/{}", prefix, route.path);
            route
        })
        .collect()
}

/// ルートの森を平坦化する
///
/// 仮想ルートは取り除かれ、パスに接頭辞を付けた子ルートがその位置に入る。
/// それ以外のルートはそのまま残し、子ルートを再帰的に平坦化する。順序は保たれる。
pub fn flatten(routes: Vec<RouteNode>) -> Vec<RouteNode> {
    flatten_with_report(routes).0
}

/// `flatten` と同じだが、展開した仮想ルートの一覧も返す
pub fn flatten_with_report(routes: Vec<RouteNode>) -> (Vec<RouteNode>, FlattenReport) {
    let mut report = FlattenReport::default();
    let mut flattened = Vec::with_capacity(routes.len());
    flatten_into(routes, &mut flattened, &mut report);
    (flattened, report)
}

fn flatten_into(routes: Vec<RouteNode>, out: &mut Vec<RouteNode>, report: &mut FlattenReport) {
    for mut route in routes {
        if route.is_virtual() {
            debug!(
                "仮想ルート '{}' を展開: {} 件の子ルート",
                route.path,
                route.children.len()
            );
            let children = apply_prefix(&route.path, route.children);
            report.collapsed.push(route.path);
            // 展開結果は仮想ルートがあった位置にそのまま追加する
            flatten_into(children, out, report);
        } else {
            if !route.children.is_empty() {
                let children = std::mem::take(&mut route.children);
                let mut nested = Vec::with_capacity(children.len());
                flatten_into(children, &mut nested, report);
                route.children = nested;
            }
            out.push(route);
        }
    }
}

/// 深さ優先で最初に見つかった仮想ルートを返す
pub fn find_virtual(routes: &[RouteNode]) -> Option<&RouteNode> {
    routes.iter().find_map(|route| {
        if route.is_virtual() {
            Some(route)
        } else {
            find_virtual(&route.children)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RenderSpec;
    use serde_json::json;

    fn view(path: &str) -> RouteNode {
        RouteNode::new(path, RenderSpec::SingleView(format!("{}View", path)))
    }

    fn group(path: &str, children: Vec<RouteNode>) -> RouteNode {
        RouteNode::new(path, RenderSpec::None).with_children(children)
    }

    #[test]
    fn classification() {
        assert!(group("a", vec![view("b")]).is_virtual());
        // 子ルートが無い
        assert!(!group("a", vec![]).is_virtual());
        // path が空
        assert!(!group("", vec![view("b")]).is_virtual());
        // 何かを描画する
        assert!(!view("a").with_children(vec![view("b")]).is_virtual());
        assert!(
            !RouteNode::new("a", RenderSpec::Redirect(json!("/a/b")))
                .with_children(vec![view("b")])
                .is_virtual()
        );
        assert!(
            !RouteNode::new("a", RenderSpec::NamedViews(Default::default()))
                .with_children(vec![view("b")])
                .is_virtual()
        );
    }

    #[test]
    fn empty_forest() {
        assert!(flatten(Vec::new()).is_empty());
    }

    #[test]
    fn prefix_is_literal_concatenation() {
        let routes = apply_prefix("a/", vec![view("/b"), view("")]);
        assert_eq!(routes[0].path, "a///b");
        assert_eq!(routes[1].path, "a/");
    }

    #[test]
    fn report_lists_collapsed_paths_in_visit_order() {
        let forest = vec![
            group("a", vec![group("b", vec![view("c")])]),
            view("d").with_children(vec![group("e", vec![view("f")])]),
        ];
        let (flat, report) = flatten_with_report(forest);

        assert_eq!(report.collapsed, vec!["a", "a/b", "e"]);
        assert_eq!(flat[0].path, "a/b/c");
        assert_eq!(flat[1].children[0].path, "e/f");
    }

    #[test]
    fn find_virtual_searches_nested_children() {
        let forest = vec![view("x").with_children(vec![group("inner", vec![view("y")])])];
        assert_eq!(find_virtual(&forest).map(|r| r.path.as_str()), Some("inner"));
        assert!(find_virtual(&flatten(forest)).is_none());
    }
}
