//! Settlers scenarios driven through the public API.

use rust_tabletop::core::{Action, ActorId, GameRng, Participant, RejectionKind, Seat};
use rust_tabletop::games::settlers::{longest_road, Board, SettlersMove};
use rust_tabletop::session::{GameKind, PlayerView, Session};
use serde_json::json;

fn trio() -> Vec<Participant> {
    vec![
        Participant::new("p0", "Ann"),
        Participant::new("p1", "Bo"),
        Participant::new("p2", "Cy"),
    ]
}

fn start() -> Session {
    Session::start(GameKind::Settlers, &trio(), &json!({ "shuffleTurnOrder": false }), 21).unwrap()
}

fn submit(session: &Session, actor: &str, mv: SettlersMove) -> Session {
    let action = Action::encode(&mv).unwrap();
    session.submit(&action, &ActorId::from(actor)).unwrap().session
}

fn board(session: &Session) -> serde_json::Value {
    serde_json::to_value(session.public_view()).unwrap()
}

/// Free vertex that satisfies the distance rule, by the public view.
fn open_vertex(view: &serde_json::Value) -> usize {
    let vertices = view["vertices"].as_array().unwrap();
    (0..vertices.len())
        .find(|&v| {
            vertices[v]["building"].is_null()
                && vertices[v]["adjacentVertices"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .all(|n| vertices[n.as_u64().unwrap() as usize]["building"].is_null())
        })
        .unwrap()
}

/// Simple path of `length` edges, found by depth-first search.
fn simple_path(board: &Board, length: usize) -> Vec<usize> {
    fn walk(board: &Board, vertex: usize, length: usize, seen: &mut Vec<usize>, edges: &mut Vec<usize>) -> bool {
        if edges.len() == length {
            return true;
        }
        for &edge in &board.vertices[vertex].edges {
            let next = board.edges[edge].other_end(vertex);
            if seen.contains(&next) {
                continue;
            }
            seen.push(next);
            edges.push(edge);
            if walk(board, next, length, seen, edges) {
                return true;
            }
            seen.pop();
            edges.pop();
        }
        false
    }

    for start in 0..board.vertices.len() {
        let mut seen = vec![start];
        let mut edges = Vec::new();
        if walk(board, start, length, &mut seen, &mut edges) {
            return edges;
        }
    }
    panic!("no simple path of {length} edges");
}

#[test]
fn test_board_topology() {
    let board = Board::generate(&mut GameRng::new(3));
    assert_eq!(board.tiles.len(), 19);
    assert_eq!(board.vertices.len(), 54);
    assert_eq!(board.edges.len(), 72);
    // Euler: V - E + F = 2 with the outer face.
    assert_eq!(54 - 72 + (19 + 1), 2);
    assert!(board.vertices.iter().all(|v| (1..=3).contains(&v.tiles.len())));

    let same = Board::generate(&mut GameRng::new(3));
    assert_eq!(board, same);
}

#[test]
fn test_longest_road_threshold_and_blocking() {
    let mut board = Board::generate(&mut GameRng::new(5));
    let path = simple_path(&board, 5);
    let owner = Seat::new(0);

    for &edge in &path[..4] {
        board.edges[edge].owner = Some(owner);
    }
    assert_eq!(longest_road(&board, owner), 4);

    board.edges[path[4]].owner = Some(owner);
    assert_eq!(longest_road(&board, owner), 5);

    // An opponent building between the second and third edge cuts the road.
    let shared = board.edges[path[1]]
        .vertices
        .into_iter()
        .find(|v| board.edges[path[2]].vertices.contains(v))
        .unwrap();
    board.vertices[shared].owner = Some(Seat::new(1));
    assert_eq!(longest_road(&board, owner), 3);
}

#[test]
fn test_settlement_next_to_occupied_vertex_rejected() {
    let session = start();
    let vertex = open_vertex(&board(&session));
    let session = submit(&session, "p0", SettlersMove::BuildSettlement { vertex_index: vertex });

    let view = board(&session);
    let edge = view["vertices"][vertex]["adjacentEdges"][0].as_u64().unwrap() as usize;
    let neighbor = view["vertices"][vertex]["adjacentVertices"][0].as_u64().unwrap() as usize;
    let session = submit(&session, "p0", SettlersMove::BuildRoad { edge_index: edge });

    for target in [vertex, neighbor] {
        let action = Action::encode(&SettlersMove::BuildSettlement { vertex_index: target }).unwrap();
        let err = session.submit(&action, &ActorId::from("p1")).unwrap_err();
        assert_eq!(err.rejection().unwrap().kind, RejectionKind::IllegalMove);
    }
}

#[test]
fn test_full_setup_then_roll() {
    let mut session = start();
    let mut order = Vec::new();
    for _ in 0..6 {
        let actor = session.current_actor().unwrap();
        order.push(actor.to_string());
        let view = board(&session);
        let vertex = open_vertex(&view);
        session = submit(&session, actor.as_str(), SettlersMove::BuildSettlement { vertex_index: vertex });
        let edge = board(&session)["vertices"][vertex]["adjacentEdges"][0].as_u64().unwrap() as usize;
        session = submit(&session, actor.as_str(), SettlersMove::BuildRoad { edge_index: edge });
    }
    assert_eq!(order, ["p0", "p1", "p2", "p2", "p1", "p0"]);
    assert_eq!(board(&session)["phase"], "roll");

    let step = session
        .submit(&Action::new("roll_dice"), &ActorId::from("p0"))
        .unwrap();
    assert!(step.events[0].is("dice_rolled"));
    assert!(step.events.windows(2).all(|w| w[0].seq < w[1].seq));
}

#[test]
fn test_views_keep_hands_private() {
    let session = start();
    let public = board(&session);
    assert!(public["players"][0].get("resources").is_none());
    assert_eq!(public["players"][0]["resourceCount"], 0);

    match session.player_view(&ActorId::from("p1")) {
        PlayerView::Settlers(view) => {
            assert!(!view.is_my_turn);
            assert_eq!(view.resources.total(), 0);
        }
        other => panic!("unexpected view {other:?}"),
    }
}
