//! Round trips against an in-process helper served on Unix sockets.
#![cfg(unix)]

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use smbmount_common::{CallContext, MountError, PathScope, ShareMapping};
use smbmount_proxy::proto::filesystem::filesystem_server::{Filesystem, FilesystemServer};
use smbmount_proxy::proto::filesystem::{
    IsMountPointRequest, IsMountPointResponse, LinkPathRequest, LinkPathResponse, MkdirRequest,
    MkdirResponse, PathContext, PathExistsRequest, PathExistsResponse, RmdirRequest,
    RmdirResponse,
};
use smbmount_proxy::proto::smb::smb_server::{Smb, SmbServer};
use smbmount_proxy::proto::smb::{NewSmbGlobalMappingRequest, NewSmbGlobalMappingResponse};
use smbmount_proxy::{FilesystemApi, FilesystemProxy, SmbApi, SmbProxy};
use tokio::net::UnixListener;
use tokio_stream::wrappers::UnixListenerStream;
use tonic::{Request, Response, Status};

#[derive(Default)]
struct HelperState {
    paths: BTreeSet<String>,
    mount_points: BTreeSet<String>,
    mkdirs: Vec<(String, PathContext)>,
    rmdirs: Vec<(String, PathContext, bool)>,
    mappings: Vec<NewSmbGlobalMappingRequest>,
}

#[derive(Clone, Default)]
struct FakeHelper {
    state: Arc<Mutex<HelperState>>,
}

#[tonic::async_trait]
impl Filesystem for FakeHelper {
    async fn path_exists(
        &self,
        request: Request<PathExistsRequest>,
    ) -> Result<Response<PathExistsResponse>, Status> {
        let path = request.into_inner().path;
        let exists = self.state.lock().unwrap().paths.contains(&path);
        Ok(Response::new(PathExistsResponse { exists }))
    }

    async fn mkdir(&self, request: Request<MkdirRequest>) -> Result<Response<MkdirResponse>, Status> {
        let req = request.into_inner();
        if !req.path.starts_with(r"c:\") {
            return Err(Status::invalid_argument("path must be absolute"));
        }
        let context = req.context();
        let mut state = self.state.lock().unwrap();
        state.paths.insert(req.path.clone());
        state.mkdirs.push((req.path, context));
        Ok(Response::new(MkdirResponse {}))
    }

    async fn rmdir(&self, request: Request<RmdirRequest>) -> Result<Response<RmdirResponse>, Status> {
        let req = request.into_inner();
        let context = req.context();
        let mut state = self.state.lock().unwrap();
        state.paths.remove(&req.path);
        state.mount_points.remove(&req.path);
        state.rmdirs.push((req.path, context, req.force));
        Ok(Response::new(RmdirResponse {}))
    }

    async fn link_path(
        &self,
        request: Request<LinkPathRequest>,
    ) -> Result<Response<LinkPathResponse>, Status> {
        let req = request.into_inner();
        let mut state = self.state.lock().unwrap();
        if !state.paths.contains(&req.source_path) {
            return Err(Status::not_found(format!("{} missing", req.source_path)));
        }
        state.paths.insert(req.target_path.clone());
        state.mount_points.insert(req.target_path);
        Ok(Response::new(LinkPathResponse {}))
    }

    async fn is_mount_point(
        &self,
        request: Request<IsMountPointRequest>,
    ) -> Result<Response<IsMountPointResponse>, Status> {
        let path = request.into_inner().path;
        let is_mount_point = self.state.lock().unwrap().mount_points.contains(&path);
        Ok(Response::new(IsMountPointResponse { is_mount_point }))
    }
}

#[tonic::async_trait]
impl Smb for FakeHelper {
    async fn new_smb_global_mapping(
        &self,
        request: Request<NewSmbGlobalMappingRequest>,
    ) -> Result<Response<NewSmbGlobalMappingResponse>, Status> {
        let req = request.into_inner();
        if req.password.is_empty() {
            return Err(Status::unauthenticated("logon failure"));
        }
        let mut state = self.state.lock().unwrap();
        state.paths.insert(req.local_path.clone());
        state.mount_points.insert(req.local_path.clone());
        state.mappings.push(req);
        Ok(Response::new(NewSmbGlobalMappingResponse {}))
    }
}

struct RunningHelper {
    fs_socket: PathBuf,
    smb_socket: PathBuf,
    helper: FakeHelper,
    _dir: tempfile::TempDir,
}

fn serve(socket: &Path, router: tonic::transport::server::Router) {
    let listener = UnixListener::bind(socket).unwrap();
    tokio::spawn(async move {
        router
            .serve_with_incoming(UnixListenerStream::new(listener))
            .await
            .unwrap();
    });
}

fn start_helper() -> RunningHelper {
    let dir = tempfile::tempdir().unwrap();
    let helper = FakeHelper::default();
    let fs_socket = dir.path().join("filesystem.sock");
    let smb_socket = dir.path().join("smb.sock");

    serve(
        &fs_socket,
        tonic::transport::Server::builder().add_service(FilesystemServer::new(helper.clone())),
    );
    serve(
        &smb_socket,
        tonic::transport::Server::builder().add_service(SmbServer::new(helper.clone())),
    );

    RunningHelper {
        fs_socket,
        smb_socket,
        helper,
        _dir: dir,
    }
}

#[test_log::test(tokio::test)]
async fn filesystem_requests_reach_helper() {
    let running = start_helper();
    let fs = FilesystemProxy::new(&running.fs_socket);
    let ctx = CallContext::background();

    assert!(!fs.path_exists(&ctx, r"c:\mnt").await.unwrap());
    fs.mkdir(&ctx, r"c:\mnt", PathScope::Plugin).await.unwrap();
    assert!(fs.path_exists(&ctx, r"c:\mnt").await.unwrap());
    assert!(!fs.is_mount_point(&ctx, r"c:\mnt").await.unwrap());

    fs.link_path(&ctx, r"c:\mnt", r"c:\pods\vol").await.unwrap();
    assert!(fs.is_mount_point(&ctx, r"c:\pods\vol").await.unwrap());

    fs.rmdir(&ctx, r"c:\pods\vol", PathScope::Pod, true)
        .await
        .unwrap();
    assert!(!fs.path_exists(&ctx, r"c:\pods\vol").await.unwrap());

    let state = running.helper.state.lock().unwrap();
    assert_eq!(state.mkdirs, vec![(r"c:\mnt".to_string(), PathContext::Plugin)]);
    assert_eq!(
        state.rmdirs,
        vec![(r"c:\pods\vol".to_string(), PathContext::Pod, true)]
    );
}

#[test_log::test(tokio::test)]
async fn helper_rejections_are_remote_errors() {
    let running = start_helper();
    let fs = FilesystemProxy::new(&running.fs_socket);
    let ctx = CallContext::background();

    let err = fs
        .mkdir(&ctx, "relative", PathScope::Plugin)
        .await
        .unwrap_err();
    match err {
        MountError::Remote {
            operation, code, ..
        } => {
            assert_eq!(operation, "Mkdir");
            assert_eq!(code, "InvalidArgument");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let err = fs
        .link_path(&ctx, r"c:\absent", r"c:\target")
        .await
        .unwrap_err();
    assert!(matches!(err, MountError::Remote { .. }), "{err:?}");
}

#[test_log::test(tokio::test)]
async fn share_mapping_round_trip() {
    let running = start_helper();
    let smb = SmbProxy::new(&running.smb_socket);
    let ctx = CallContext::background().with_timeout(Duration::from_secs(5));

    let mapping = ShareMapping {
        local_path: r"c:\mnt\smb".into(),
        remote_path: r"\\10.0.0.7\share".into(),
        username: "user".into(),
        password: "pass".into(),
    };
    smb.new_smb_global_mapping(&ctx, &mapping).await.unwrap();
    // A repeat is accepted; the helper owns idempotency.
    smb.new_smb_global_mapping(&ctx, &mapping).await.unwrap();

    let rejected = ShareMapping {
        password: String::new(),
        ..mapping.clone()
    };
    let err = smb
        .new_smb_global_mapping(&ctx, &rejected)
        .await
        .unwrap_err();
    assert!(matches!(err, MountError::Remote { .. }), "{err:?}");

    let state = running.helper.state.lock().unwrap();
    assert_eq!(state.mappings.len(), 2);
    assert_eq!(state.mappings[0].remote_path, r"\\10.0.0.7\share");
    assert_eq!(state.mappings[0].username, "user");
}

#[test_log::test(tokio::test)]
async fn unreachable_helper_is_transport_error() {
    let dir = tempfile::tempdir().unwrap();
    let fs = FilesystemProxy::new(dir.path().join("nobody-listens.sock"));

    let err = fs
        .path_exists(&CallContext::background(), r"c:\mnt")
        .await
        .unwrap_err();
    assert!(matches!(err, MountError::Transport { .. }), "{err:?}");
}
